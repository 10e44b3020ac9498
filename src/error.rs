//! Error taxonomy for assumption validation
//!
//! Only `DataFormat` aborts an evaluation. Every other variant is contained
//! by the component that produced it and surfaces in the report as a
//! [`crate::guardian::Note`].

use thiserror::Error;

/// Errors raised by the validation core and the transformation engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardianError {
    #[error("Malformed data: {reason}")]
    DataFormat { reason: String },

    #[error("No validators registered for test type '{name}'")]
    UnknownTestType { name: String },

    #[error("Validator '{validator}' unavailable: {reason}")]
    ValidatorUnavailable { validator: String, reason: String },

    #[error("Transformation '{transform}' not applicable: {reason}")]
    TransformationNotApplicable { transform: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load test registry: {0}")]
    RegistryLoad(String),
}

impl GuardianError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            GuardianError::DataFormat { .. } => "data_format_error",
            GuardianError::UnknownTestType { .. } => "unknown_test_type",
            GuardianError::ValidatorUnavailable { .. } => "validator_unavailable",
            GuardianError::TransformationNotApplicable { .. } => "transformation_not_applicable",
            GuardianError::InvalidConfig(_) => "invalid_config",
            GuardianError::RegistryLoad(_) => "registry_load_error",
        }
    }

    pub(crate) fn data_format(reason: impl Into<String>) -> Self {
        GuardianError::DataFormat {
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(validator: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardianError::ValidatorUnavailable {
            validator: validator.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_applicable(transform: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardianError::TransformationNotApplicable {
            transform: transform.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardianError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            GuardianError::data_format("empty").code(),
            "data_format_error"
        );
        assert_eq!(
            GuardianError::unavailable("normality", "n too small").code(),
            "validator_unavailable"
        );
        assert_eq!(
            GuardianError::not_applicable("log", "negative values").code(),
            "transformation_not_applicable"
        );
        assert_eq!(
            GuardianError::UnknownTestType {
                name: "foo".to_string()
            }
            .code(),
            "unknown_test_type"
        );
    }

    #[test]
    fn test_display_is_human_readable() {
        let err = GuardianError::unavailable("variance_homogeneity", "requires 2+ groups");
        assert_eq!(
            err.to_string(),
            "Validator 'variance_homogeneity' unavailable: requires 2+ groups"
        );
    }
}
