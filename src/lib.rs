//! stat-guardian - Statistical assumption validation and remediation
//!
//! Checks whether data satisfies the assumptions a statistical test relies
//! on (normality, homogeneity of variance, independence, linearity, outlier
//! influence, unimodality, sample size), decides whether the test may
//! proceed, recommends alternative tests, and repairs distributional
//! problems with invertible transforms.
//!
//! ```
//! use stat_guardian::{Dataset, Guardian, ValidationRequest};
//!
//! let guardian = Guardian::standard()?;
//! let data = Dataset::from_groups(vec![
//!     vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0],
//!     vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0],
//! ])?;
//! let report = guardian.evaluate(&ValidationRequest::new(data, "mann_whitney", 0.05)?)?;
//! assert!(report.can_proceed);
//! # Ok::<(), stat_guardian::GuardianError>(())
//! ```

pub mod cli;
pub mod confidence;
pub mod dataset;
pub mod descriptive;
pub mod error;
pub mod evidence;
pub mod guardian;
pub mod registry;
pub mod special;
pub mod summary;
pub mod transform;
pub mod validators;

pub use confidence::confidence_score;
pub use dataset::{Dataset, TestType, ValidationRequest};
pub use error::{GuardianError, Result};
pub use evidence::{EvidenceError, EvidenceRef, EvidenceRenderer, NoopRenderer};
pub use guardian::{Alternative, Guardian, GuardianConfig, GuardianReport, Note};
pub use registry::{InputShape, TestRegistry, TestRegistryEntry};
pub use transform::{
    InverseMapping, Transform, TransformKind, TransformValidation, TransformationSuggestion,
    TransformedData,
};
pub use validators::{Assumption, AssumptionCheck, Severity, Validator};
