use super::definition::{RawEntry, TestRegistryEntry};
use crate::dataset::TestType;
use crate::error::{GuardianError, Result};
use crate::guardian::Note;
use crate::validators::Assumption;
use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const DEFAULT_TOML: &str = include_str!("../../registry-default.toml");

#[derive(serde::Deserialize)]
struct RegistryFile {
    #[serde(default)]
    test: Vec<RawEntry>,
}

/// Immutable table of statistical tests and their preconditions
///
/// Built once and shared behind an `Arc`; nothing mutates it after
/// construction.
///
/// # Example Usage
/// ```
/// use stat_guardian::registry::TestRegistry;
/// use stat_guardian::TestType;
///
/// let registry = TestRegistry::standard()?;
/// let resolution = registry.resolve(&TestType::TTest);
/// assert!(!resolution.validators().is_empty());
/// # Ok::<(), stat_guardian::GuardianError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TestRegistry {
    entries: Vec<TestRegistryEntry>,

    /// Fast lookup: test type → entry index
    index: HashMap<TestType, usize>,
}

impl TestRegistry {
    /// Registry compiled into the binary from `registry-default.toml`
    pub fn standard() -> Result<Self> {
        Self::from_toml_str(DEFAULT_TOML)
    }

    /// Load registry entries from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or fails
    /// [`TestRegistry::from_toml_str`] validation.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid registry file: {}", path.display()))
    }

    /// Parse registry entries from TOML text
    ///
    /// # Errors
    /// `RegistryLoad` on invalid TOML, duplicate test ids, unknown
    /// assumption names or inconsistent sample sizes.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content)
            .map_err(|e| GuardianError::RegistryLoad(format!("invalid TOML: {}", e)))?;
        let entries = file
            .test
            .into_iter()
            .map(TestRegistryEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::from_entries(entries)
    }

    pub fn builder() -> TestRegistryBuilder {
        TestRegistryBuilder::default()
    }

    fn from_entries(entries: Vec<TestRegistryEntry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.test_type.clone(), i).is_some() {
                return Err(GuardianError::RegistryLoad(format!(
                    "duplicate test id '{}'",
                    entry.test_type
                )));
            }
        }
        debug!(entries = entries.len(), "test registry loaded");
        Ok(Self { entries, index })
    }

    /// Look up a test; unknown ids resolve to an empty validator set
    pub fn resolve(&self, test_type: &TestType) -> Resolution<'_> {
        match self.get(test_type) {
            Some(entry) => Resolution::Registered(entry),
            None => Resolution::Unregistered {
                test_type: test_type.clone(),
            },
        }
    }

    pub fn get(&self, test_type: &TestType) -> Option<&TestRegistryEntry> {
        self.index.get(test_type).map(|&i| &self.entries[i])
    }

    /// All entries in registration order
    pub fn entries(&self) -> &[TestRegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Programmatic registry construction
#[derive(Debug, Default)]
pub struct TestRegistryBuilder {
    entries: Vec<TestRegistryEntry>,
}

impl TestRegistryBuilder {
    pub fn register(mut self, entry: TestRegistryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Validate every entry and build the registry
    pub fn build(self) -> Result<TestRegistry> {
        for entry in &self.entries {
            entry.validate()?;
        }
        TestRegistry::from_entries(self.entries)
    }
}

/// Outcome of a registry lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Registered(&'a TestRegistryEntry),
    Unregistered { test_type: TestType },
}

impl Resolution<'_> {
    pub fn entry(&self) -> Option<&TestRegistryEntry> {
        match self {
            Resolution::Registered(entry) => Some(entry),
            Resolution::Unregistered { .. } => None,
        }
    }

    pub fn validators(&self) -> &[Assumption] {
        self.entry().map(|e| e.validators.as_slice()).unwrap_or_default()
    }

    /// `unknown_test_type` note for unregistered tests
    pub fn note(&self) -> Option<Note> {
        match self {
            Resolution::Registered(_) => None,
            Resolution::Unregistered { test_type } => {
                Some(Note::from(&GuardianError::UnknownTestType {
                    name: test_type.id().to_string(),
                }))
            }
        }
    }
}
