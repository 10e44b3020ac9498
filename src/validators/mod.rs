// Assumption validators
//
// Each validator checks one precondition of a statistical test and reports
// it as an `AssumptionCheck`. Validators are stateless, perform no I/O and
// never share data, so the orchestrator may run them in parallel.
//
// A validator that cannot compute on degenerate input returns
// `GuardianError::ValidatorUnavailable`; the orchestrator turns that into a
// contained note instead of failing the evaluation.
//
// Scientific Foundation:
// [1] Shapiro, S. S., & Wilk, M. B. (1965). An analysis of variance test for
//     normality. Biometrika, 52(3-4), 591-611.
// [2] Brown, M. B., & Forsythe, A. B. (1974). Robust tests for the equality
//     of variances. JASA, 69(346), 364-367.
// [3] Iglewicz, B., & Hoaglin, D. (1993). How to Detect and Handle Outliers.
// [4] Wald, A., & Wolfowitz, J. (1940). On a test whether two samples are
//     from the same population. Annals of Mathematical Statistics, 11(2).

mod independence;
mod linearity;
mod modality;
mod normality;
mod outliers;
mod sample_size;
mod variance;

pub use independence::IndependenceValidator;
pub use linearity::{LinearityValidator, MIN_RUNS_TEST_N};
pub use modality::ModalityValidator;
pub use normality::{shapiro_wilk, NormalityValidator, ShapiroWilk, MAX_SHAPIRO_N};
pub(crate) use normality::thin;
pub use outliers::OutlierDetector;
pub use sample_size::{SampleRequirement, SampleSizeValidator};
pub use variance::{levene_median, VarianceHomogeneityValidator, VARIANCE_RATIO_CRITICAL};

use crate::dataset::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Assumption identifier; doubles as the violation type in alternative rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assumption {
    Normality,
    VarianceHomogeneity,
    Independence,
    Outliers,
    SampleSize,
    Modality,
    Linearity,
}

impl Assumption {
    pub const ALL: [Assumption; 7] = [
        Assumption::Normality,
        Assumption::VarianceHomogeneity,
        Assumption::Independence,
        Assumption::Outliers,
        Assumption::SampleSize,
        Assumption::Modality,
        Assumption::Linearity,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Assumption::Normality => "normality",
            Assumption::VarianceHomogeneity => "variance_homogeneity",
            Assumption::Independence => "independence",
            Assumption::Outliers => "outliers",
            Assumption::SampleSize => "sample_size",
            Assumption::Modality => "modality",
            Assumption::Linearity => "linearity",
        }
    }

    /// Human-readable assumption name
    pub fn display_name(self) -> &'static str {
        match self {
            Assumption::Normality => "Normality",
            Assumption::VarianceHomogeneity => "Homogeneity of variance",
            Assumption::Independence => "Independence of observations",
            Assumption::Outliers => "Absence of influential outliers",
            Assumption::SampleSize => "Adequate sample size",
            Assumption::Modality => "Unimodality",
            Assumption::Linearity => "Linearity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == s)
    }

    /// Whether this validator can report a critical violation
    pub fn can_block(self) -> bool {
        !matches!(self, Assumption::Normality | Assumption::Modality)
    }
}

impl fmt::Display for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Impact of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No violation
    None,
    /// Informational, no action required
    Info,
    /// Test may proceed with caution
    Warning,
    /// Blocks the requested test
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Outcome of one validator on one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionCheck {
    pub assumption: Assumption,
    pub assumption_name: String,
    pub test_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub violated: bool,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
    /// 1-based group the result refers to, for per-group validators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
    /// Low-power or similar advisory that does not block the test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

impl AssumptionCheck {
    /// A passing check
    pub fn satisfied(assumption: Assumption, message: impl Into<String>) -> Self {
        Self {
            assumption,
            assumption_name: assumption.display_name().to_string(),
            test_statistic: None,
            p_value: None,
            violated: false,
            severity: Severity::None,
            message: message.into(),
            recommendation: String::new(),
            group: None,
            advisory: None,
        }
    }

    /// A violated check; `Severity::None` is promoted to `Info`
    pub fn violation(
        assumption: Assumption,
        severity: Severity,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            assumption,
            assumption_name: assumption.display_name().to_string(),
            test_statistic: None,
            p_value: None,
            violated: true,
            severity: severity.max(Severity::Info),
            message: message.into(),
            recommendation: recommendation.into(),
            group: None,
            advisory: None,
        }
    }

    pub fn with_statistic(mut self, statistic: f64) -> Self {
        self.test_statistic = Some(statistic);
        self
    }

    pub fn with_p_value(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    pub fn with_group(mut self, group: usize) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_advisory(mut self, advisory: impl Into<String>) -> Self {
        self.advisory = Some(advisory.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.violated && self.severity == Severity::Critical
    }
}

/// Capability shared by every validator
pub trait Validator: Send + Sync {
    fn assumption(&self) -> Assumption;

    /// Check the assumption at significance level `alpha`
    fn check(&self, data: &Dataset, alpha: f64) -> Result<AssumptionCheck>;
}

/// Resolves assumption identifiers to validator implementations
///
/// Sample-size validators are built per test from the registry's
/// requirement; every other assumption maps to a stateless unit validator.
/// Overrides replace either kind, which is how tests inject failing or
/// instrumented validators.
#[derive(Clone, Default)]
pub struct ValidatorTable {
    overrides: HashMap<Assumption, Arc<dyn Validator>>,
}

impl fmt::Debug for ValidatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overrides: Vec<_> = self.overrides.keys().map(|a| a.id()).collect();
        overrides.sort_unstable();
        f.debug_struct("ValidatorTable")
            .field("overrides", &overrides)
            .finish()
    }
}

impl ValidatorTable {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Replace the validator used for one assumption
    pub fn with_override(mut self, validator: Arc<dyn Validator>) -> Self {
        self.overrides.insert(validator.assumption(), validator);
        self
    }

    pub fn resolve(
        &self,
        assumption: Assumption,
        requirement: SampleRequirement,
    ) -> Arc<dyn Validator> {
        if let Some(v) = self.overrides.get(&assumption) {
            return Arc::clone(v);
        }
        match assumption {
            Assumption::Normality => Arc::new(NormalityValidator),
            Assumption::VarianceHomogeneity => Arc::new(VarianceHomogeneityValidator),
            Assumption::Independence => Arc::new(IndependenceValidator),
            Assumption::Outliers => Arc::new(OutlierDetector),
            Assumption::SampleSize => Arc::new(SampleSizeValidator::new(requirement)),
            Assumption::Modality => Arc::new(ModalityValidator),
            Assumption::Linearity => Arc::new(LinearityValidator),
        }
    }
}

/// Apply `check_group` to every group and keep the most severe result
///
/// Ties on severity go to the smallest p-value, then to the earliest
/// group. Multi-group results carry their 1-based group index.
pub(crate) fn worst_group<F>(data: &Dataset, mut check_group: F) -> Result<AssumptionCheck>
where
    F: FnMut(&[f64]) -> Result<AssumptionCheck>,
{
    let multi = data.group_count() > 1;
    let mut worst: Option<AssumptionCheck> = None;

    for (i, group) in data.groups().iter().enumerate() {
        let mut check = check_group(group)?;
        if multi {
            check.group = Some(i + 1);
            check.message = format!("group {}: {}", i + 1, check.message);
        }
        let replace = match &worst {
            None => true,
            Some(current) => {
                let p_new = check.p_value.unwrap_or(1.0);
                let p_cur = current.p_value.unwrap_or(1.0);
                check.severity > current.severity
                    || (check.severity == current.severity
                        && check.violated
                        && !current.violated)
                    || (check.severity == current.severity
                        && check.violated == current.violated
                        && p_new < p_cur)
            }
        };
        if replace {
            worst = Some(check);
        }
    }

    worst.ok_or_else(|| crate::error::GuardianError::data_format("dataset has no groups"))
}
