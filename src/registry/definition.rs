use crate::dataset::TestType;
use crate::error::{GuardianError, Result};
use crate::validators::{Assumption, SampleRequirement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How validators see the request data
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputShape {
    /// Validators see the groups as given
    Groups,
    /// Two equal-length groups reduced to their element-wise difference
    PairedDifferences,
    /// `[x, y]` (or a single `y`); residual-based checks see the linear fit
    Regression,
}

/// Registered preconditions and fallbacks for one statistical test
///
/// # Example TOML
/// ```toml
/// [[test]]
/// id = "t_test"
/// description = "Independent two-sample Student's t-test"
/// input = "groups"
/// validators = ["sample_size", "normality", "variance_homogeneity"]
/// sample_size = { minimum = 3, recommended = 30 }
///
/// [test.alternatives]
/// normality = ["mann_whitney"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRegistryEntry {
    pub test_type: TestType,

    pub description: String,

    pub input: InputShape,

    /// Assumptions to check, in report order
    pub validators: Vec<Assumption>,

    pub sample_size: SampleRequirement,

    /// Alternative tests per violated assumption, best first
    pub alternatives: BTreeMap<Assumption, Vec<String>>,
}

impl TestRegistryEntry {
    pub fn new(test_type: impl Into<TestType>, input: InputShape) -> Self {
        Self {
            test_type: test_type.into(),
            description: String::new(),
            input,
            validators: Vec::new(),
            sample_size: SampleRequirement::default(),
            alternatives: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_validators(mut self, validators: &[Assumption]) -> Self {
        self.validators = validators.to_vec();
        self
    }

    pub fn with_sample_size(mut self, minimum: usize, recommended: usize) -> Self {
        self.sample_size = SampleRequirement {
            minimum,
            recommended,
        };
        self
    }

    pub fn with_alternatives(mut self, assumption: Assumption, tests: &[&str]) -> Self {
        self.alternatives
            .insert(assumption, tests.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Alternatives registered for a violated assumption
    pub fn alternatives_for(&self, assumption: Assumption) -> &[String] {
        self.alternatives
            .get(&assumption)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check internal consistency of the entry
    ///
    /// # Errors
    /// `RegistryLoad` when a validator is listed twice, the minimum sample
    /// size exceeds the recommended one, or a validator that can block the
    /// test has no alternative.
    pub fn validate(&self) -> Result<()> {
        let id = self.test_type.id();
        if id.is_empty() {
            return Err(GuardianError::RegistryLoad(
                "test entry with empty id".to_string(),
            ));
        }
        for (i, a) in self.validators.iter().enumerate() {
            if self.validators[..i].contains(a) {
                return Err(GuardianError::RegistryLoad(format!(
                    "test '{}' lists validator '{}' twice",
                    id, a
                )));
            }
        }
        if self.sample_size.minimum > self.sample_size.recommended {
            return Err(GuardianError::RegistryLoad(format!(
                "test '{}' has minimum sample size {} above recommended {}",
                id, self.sample_size.minimum, self.sample_size.recommended
            )));
        }
        if let Some(a) = self
            .validators
            .iter()
            .find(|a| a.can_block() && self.alternatives_for(**a).is_empty())
        {
            return Err(GuardianError::RegistryLoad(format!(
                "test '{}' can be blocked by '{}' but lists no alternative for it",
                id, a
            )));
        }
        Ok(())
    }
}

/// Entry as written in TOML, before assumption names are checked
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawEntry {
    id: String,
    #[serde(default)]
    description: String,
    input: InputShape,
    #[serde(default)]
    validators: Vec<String>,
    #[serde(default)]
    sample_size: Option<SampleRequirement>,
    #[serde(default)]
    alternatives: BTreeMap<String, Vec<String>>,
}

fn parse_assumption(test: &str, name: &str) -> Result<Assumption> {
    Assumption::parse(name).ok_or_else(|| {
        GuardianError::RegistryLoad(format!(
            "test '{}' references unknown assumption '{}'",
            test, name
        ))
    })
}

impl TryFrom<RawEntry> for TestRegistryEntry {
    type Error = GuardianError;

    fn try_from(raw: RawEntry) -> Result<Self> {
        let validators = raw
            .validators
            .iter()
            .map(|name| parse_assumption(&raw.id, name))
            .collect::<Result<Vec<_>>>()?;
        let alternatives = raw
            .alternatives
            .into_iter()
            .map(|(name, tests)| Ok((parse_assumption(&raw.id, &name)?, tests)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        let entry = TestRegistryEntry {
            test_type: TestType::from(raw.id.as_str()),
            description: raw.description,
            input: raw.input,
            validators,
            sample_size: raw.sample_size.unwrap_or_default(),
            alternatives,
        };
        entry.validate()?;
        Ok(entry)
    }
}
