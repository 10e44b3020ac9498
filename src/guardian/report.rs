// Guardian report: the decision, the evidence behind it, and what to do next

use crate::dataset::TestType;
use crate::error::GuardianError;
use crate::evidence::EvidenceRef;
use crate::summary::GroupSummary;
use crate::validators::{Assumption, AssumptionCheck};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Machine-readable note about something that did not run as requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub code: String,
    pub message: String,
}

impl Note {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&GuardianError> for Note {
    fn from(err: &GuardianError) -> Self {
        Note::new(err.code(), err.to_string())
    }
}

/// Alternative test suggested because of a violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub test_name: String,
    pub reason: String,
}

/// Result of evaluating one request
///
/// `can_proceed` is true exactly when `critical_violations` is empty; the
/// confidence score and evidence never influence it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianReport {
    pub test_type: TestType,

    pub alpha: f64,

    pub can_proceed: bool,

    /// Every check that ran, in registry order
    pub checks: Vec<AssumptionCheck>,

    pub violations: Vec<AssumptionCheck>,

    pub critical_violations: Vec<AssumptionCheck>,

    /// Heuristic trust score in [0, 1]
    pub confidence_score: f64,

    pub alternatives: Vec<Alternative>,

    /// Non-blocking advisories such as low statistical power
    pub advisories: Vec<String>,

    pub notes: Vec<Note>,

    pub summaries: Vec<GroupSummary>,

    /// Assumption id → rendered evidence, when evidence was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_evidence: Option<BTreeMap<String, EvidenceRef>>,
}

impl GuardianReport {
    /// The check for one assumption, if it ran
    pub fn check(&self, assumption: Assumption) -> Option<&AssumptionCheck> {
        self.checks.iter().find(|c| c.assumption == assumption)
    }

    pub fn is_violated(&self, assumption: Assumption) -> bool {
        self.violations.iter().any(|c| c.assumption == assumption)
    }

    pub fn has_note(&self, code: &str) -> bool {
        self.notes.iter().any(|n| n.code == code)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        if self.can_proceed {
            report.push_str(&format!("✅ {} MAY PROCEED\n\n", self.test_type));
        } else {
            report.push_str(&format!(
                "❌ {} BLOCKED ({} critical violation{})\n\n",
                self.test_type,
                self.critical_violations.len(),
                if self.critical_violations.len() == 1 { "" } else { "s" }
            ));
        }
        report.push_str(&format!(
            "Significance level: {} ({}% confidence)\n",
            self.alpha,
            (1.0 - self.alpha) * 100.0
        ));
        report.push_str(&format!("Confidence score: {:.3}\n", self.confidence_score));

        if !self.checks.is_empty() {
            report.push_str("\n📋 Assumption Checks:\n");
            for check in &self.checks {
                if check.violated {
                    report.push_str(&format!(
                        "  ✗ [{}] {}: {}\n",
                        check.severity, check.assumption_name, check.message
                    ));
                    if !check.recommendation.is_empty() {
                        report.push_str(&format!("      → {}\n", check.recommendation));
                    }
                } else {
                    report.push_str(&format!(
                        "  ✓ {}: {}\n",
                        check.assumption_name, check.message
                    ));
                }
            }
        }

        if !self.alternatives.is_empty() {
            report.push_str("\n💡 Alternatives:\n");
            for alt in &self.alternatives {
                report.push_str(&format!("  - {} ({})\n", alt.test_name, alt.reason));
            }
        }

        if !self.advisories.is_empty() {
            report.push_str("\n⚠️  Advisories:\n");
            for advisory in &self.advisories {
                report.push_str(&format!("  - {}\n", advisory));
            }
        }

        if !self.notes.is_empty() {
            report.push_str("\n📝 Notes:\n");
            for note in &self.notes {
                report.push_str(&format!("  - [{}] {}\n", note.code, note.message));
            }
        }

        if !self.summaries.is_empty() {
            report.push_str("\n📊 Group Summaries:\n");
            for s in &self.summaries {
                report.push_str(&format!(
                    "  group {}: n={}, mean={:.3}, sd={:.3}, median={:.3}, range=[{:.3}, {:.3}]\n",
                    s.group, s.n, s.mean, s.stddev, s.median, s.min, s.max
                ));
            }
        }

        if let Some(evidence) = &self.visual_evidence {
            if !evidence.is_empty() {
                report.push_str("\n🖼  Evidence:\n");
                for (check, r) in evidence {
                    report.push_str(&format!("  {}: {} ({})\n", check, r.kind, r.media_type));
                }
            }
        }

        report
    }
}
