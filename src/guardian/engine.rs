use super::config::GuardianConfig;
use super::report::{Alternative, GuardianReport, Note};
use super::views::ViewSet;
use crate::confidence::confidence_score;
use crate::dataset::{Dataset, TestType, ValidationRequest};
use crate::error::{GuardianError, Result};
use crate::evidence::{EvidenceError, EvidenceRef, EvidenceRenderer};
use crate::registry::{InputShape, TestRegistry, TestRegistryEntry};
use crate::summary::summarize;
use crate::validators::{Assumption, AssumptionCheck, SampleRequirement, Validator, ValidatorTable};
use crossbeam::channel::{self, RecvTimeoutError};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type Outcome = (Assumption, Result<AssumptionCheck>);

/// Assumption validation orchestrator
///
/// Stateless between calls: the registry is shared and immutable, so one
/// `Guardian` can serve concurrent evaluations by reference or `Arc`.
///
/// # Example
/// ```
/// use stat_guardian::{Dataset, Guardian, ValidationRequest};
///
/// let guardian = Guardian::standard()?;
/// let data = Dataset::from_groups(vec![
///     vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 100.0],
///     vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0],
/// ])?;
/// let report = guardian.evaluate(&ValidationRequest::new(data, "t_test", 0.05)?)?;
/// assert!(!report.can_proceed);
/// assert!(report.alternatives.iter().any(|a| a.test_name == "mann_whitney"));
/// # Ok::<(), stat_guardian::GuardianError>(())
/// ```
#[derive(Clone)]
pub struct Guardian {
    registry: Arc<TestRegistry>,
    validators: ValidatorTable,
    config: GuardianConfig,
    renderer: Option<Arc<dyn EvidenceRenderer>>,
}

impl fmt::Debug for Guardian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guardian")
            .field("tests", &self.registry.len())
            .field("validators", &self.validators)
            .field("config", &self.config)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Guardian {
    pub fn new(registry: Arc<TestRegistry>) -> Self {
        Self {
            registry,
            validators: ValidatorTable::standard(),
            config: GuardianConfig::default(),
            renderer: None,
        }
    }

    /// Guardian over the embedded default registry
    pub fn standard() -> Result<Self> {
        Ok(Self::new(Arc::new(TestRegistry::standard()?)))
    }

    pub fn with_config(mut self, config: GuardianConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_validators(mut self, validators: ValidatorTable) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn EvidenceRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    /// Parse JSON data and evaluate it; `alpha` falls back to the config
    pub fn evaluate_json(
        &self,
        data_json: &str,
        test_type: impl Into<TestType>,
        alpha: Option<f64>,
    ) -> Result<GuardianReport> {
        let data = Dataset::from_json_str(data_json)?;
        let alpha = alpha.unwrap_or(self.config.default_alpha);
        self.evaluate(&ValidationRequest::new(data, test_type, alpha)?)
    }

    /// Check every registered assumption of the requested test
    ///
    /// # Errors
    /// Only `DataFormat`, for an alpha outside (0, 1). Unknown tests,
    /// unavailable validators and evidence failures become report notes.
    pub fn evaluate(&self, request: &ValidationRequest) -> Result<GuardianReport> {
        let alpha = request.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(GuardianError::data_format(format!(
                "alpha must be in (0, 1), got {}",
                alpha
            )));
        }

        let resolution = self.registry.resolve(&request.test_type);
        let mut notes = Vec::new();
        if let Some(note) = resolution.note() {
            warn!(test = %request.test_type, "no validators registered for test type");
            notes.push(note);
        }
        let entry = resolution.entry();
        let (shape, requirement) = entry
            .map(|e| (e.input, e.sample_size))
            .unwrap_or((InputShape::Groups, SampleRequirement::default()));

        let views = ViewSet::derive(shape, &request.data);
        let outcomes = self.run_validators(resolution.validators(), requirement, &views, alpha);

        let mut checks = Vec::with_capacity(outcomes.len());
        for (assumption, outcome) in outcomes {
            match outcome {
                Ok(check) => {
                    debug!(
                        validator = assumption.id(),
                        violated = check.violated,
                        severity = %check.severity,
                        "validator finished"
                    );
                    checks.push(check);
                }
                Err(err) => {
                    warn!(validator = assumption.id(), error = %err, "validator unavailable");
                    notes.push(Note::from(&err));
                }
            }
        }

        let violations: Vec<AssumptionCheck> =
            checks.iter().filter(|c| c.violated).cloned().collect();
        let critical_violations: Vec<AssumptionCheck> = violations
            .iter()
            .filter(|c| c.is_critical())
            .cloned()
            .collect();
        let can_proceed = critical_violations.is_empty();
        let confidence = confidence_score(&checks);
        let alternatives = entry
            .map(|e| select_alternatives(e, &violations))
            .unwrap_or_default();
        let advisories = checks.iter().filter_map(|c| c.advisory.clone()).collect();

        // Decision is fixed; evidence can only add references and notes
        let visual_evidence = if self.config.include_evidence {
            self.collect_evidence(&checks, &views, &mut notes)
        } else {
            None
        };

        info!(
            test = %request.test_type,
            can_proceed,
            confidence,
            violations = violations.len(),
            critical = critical_violations.len(),
            "evaluation complete"
        );

        Ok(GuardianReport {
            test_type: request.test_type.clone(),
            alpha,
            can_proceed,
            checks,
            violations,
            critical_violations,
            confidence_score: confidence,
            alternatives,
            advisories,
            notes,
            summaries: summarize(&request.data),
            visual_evidence,
        })
    }

    /// Fan out over validators and join in registry order
    fn run_validators(
        &self,
        assumptions: &[Assumption],
        requirement: SampleRequirement,
        views: &ViewSet<'_>,
        alpha: f64,
    ) -> Vec<Outcome> {
        let jobs: Vec<(Assumption, Arc<dyn Validator>)> = assumptions
            .iter()
            .map(|&a| (a, self.validators.resolve(a, requirement)))
            .collect();
        let run = |assumption: Assumption, validator: &Arc<dyn Validator>| {
            views
                .view(assumption)
                .and_then(|data| validator.check(data, alpha))
        };

        if !self.config.parallel || jobs.len() < 2 {
            return jobs
                .iter()
                .map(|(a, v)| {
                    let outcome = catch_unwind(AssertUnwindSafe(|| run(*a, v)))
                        .unwrap_or_else(|_| Err(panicked(*a)));
                    (*a, outcome)
                })
                .collect();
        }

        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|(a, v)| (*a, s.spawn(move |_| run(*a, v))))
                .collect();
            handles
                .into_iter()
                .map(|(a, handle)| (a, handle.join().unwrap_or_else(|_| Err(panicked(a)))))
                .collect()
        })
        .unwrap_or_else(|_| {
            assumptions
                .iter()
                .map(|&a| (a, Err(panicked(a))))
                .collect()
        })
    }

    /// Best-effort evidence within the configured time budget
    ///
    /// Renders run on a detached worker so a slow renderer cannot hold the
    /// report past the deadline; dropping the receiver stops the worker after
    /// its current render.
    fn collect_evidence(
        &self,
        checks: &[AssumptionCheck],
        views: &ViewSet<'_>,
        notes: &mut Vec<Note>,
    ) -> Option<BTreeMap<String, EvidenceRef>> {
        let renderer = Arc::clone(self.renderer.as_ref()?);
        let deadline = Instant::now() + Duration::from_millis(self.config.evidence_budget_ms);
        let jobs: Vec<(Assumption, Dataset)> = checks
            .iter()
            .filter_map(|c| views.view(c.assumption).ok().map(|d| (c.assumption, d.clone())))
            .collect();
        let expected = jobs.len();

        let (tx, rx) = channel::unbounded::<(Assumption, std::result::Result<EvidenceRef, EvidenceError>)>();
        let worker = thread::Builder::new()
            .name("evidence-renderer".to_string())
            .spawn(move || {
                for (assumption, data) in jobs {
                    let rendered = catch_unwind(AssertUnwindSafe(|| renderer.render(&data, assumption)))
                        .unwrap_or_else(|_| Err(EvidenceError::Failed("renderer panicked".to_string())));
                    if tx.send((assumption, rendered)).is_err() {
                        break;
                    }
                }
            });
        if let Err(err) = worker {
            warn!(error = %err, "failed to start evidence renderer");
            notes.push(Note::new(
                "evidence_unavailable",
                format!("renderer thread could not start: {}", err),
            ));
            return Some(BTreeMap::new());
        }

        let mut evidence = BTreeMap::new();
        for received in 0..expected {
            let (assumption, rendered) = match rx.recv_deadline(deadline) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(skipped = expected - received, "evidence budget exhausted");
                    notes.push(Note::new(
                        "evidence_unavailable",
                        format!(
                            "evidence budget of {} ms exhausted; {} check(s) without evidence",
                            self.config.evidence_budget_ms,
                            expected - received
                        ),
                    ));
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };
            match rendered {
                Ok(r) => {
                    evidence.insert(assumption.id().to_string(), r);
                }
                Err(EvidenceError::Disabled) => {}
                Err(err) => {
                    debug!(check = assumption.id(), error = %err, "evidence rendering failed");
                    notes.push(Note::new(
                        "evidence_unavailable",
                        format!("{}: {}", assumption.id(), err),
                    ));
                }
            }
        }
        Some(evidence)
    }
}

fn panicked(assumption: Assumption) -> GuardianError {
    GuardianError::unavailable(assumption.id(), "validator panicked")
}

/// Alternatives from violated checks, most severe first, then registry
/// order, without duplicates
fn select_alternatives(entry: &TestRegistryEntry, violations: &[AssumptionCheck]) -> Vec<Alternative> {
    let mut ordered: Vec<&AssumptionCheck> = violations.iter().collect();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut alternatives: Vec<Alternative> = Vec::new();
    for check in ordered {
        for test in entry.alternatives_for(check.assumption) {
            if alternatives.iter().any(|a| &a.test_name == test) {
                continue;
            }
            alternatives.push(Alternative {
                test_name: test.clone(),
                reason: format!(
                    "{} violated ({})",
                    check.assumption_name, check.severity
                ),
            });
        }
    }
    alternatives
}
