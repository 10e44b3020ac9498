// Registry loading and resolution

use super::*;
use crate::dataset::TestType;
use crate::validators::Assumption;
use std::io::Write;
use tempfile::NamedTempFile;

const MINIMAL: &str = r#"
[[test]]
id = "custom_anova"
description = "House ANOVA variant"
input = "groups"
validators = ["normality", "outliers"]
sample_size = { minimum = 5, recommended = 10 }

[test.alternatives]
outliers = ["kruskal_wallis"]
"#;

#[test]
fn test_standard_registry_loads() {
    let registry = TestRegistry::standard().expect("embedded registry must parse");
    assert_eq!(registry.len(), 10);
    for id in ["t_test", "anova", "pearson", "linear_regression", "mann_whitney"] {
        assert!(registry.get(&TestType::from(id)).is_some(), "missing {}", id);
    }
}

#[test]
fn test_selective_validation_sets() {
    let registry = TestRegistry::standard().unwrap();
    for id in ["mann_whitney", "wilcoxon_signed_rank", "kruskal_wallis"] {
        assert!(registry.resolve(&TestType::from(id)).validators().is_empty());
    }
    for id in ["spearman", "bootstrap"] {
        assert_eq!(
            registry.resolve(&TestType::from(id)).validators(),
            &[Assumption::Independence]
        );
    }
    let t = registry.resolve(&TestType::TTest);
    assert!(t.validators().contains(&Assumption::Normality));
    assert!(t.validators().contains(&Assumption::VarianceHomogeneity));
}

#[test]
fn test_alias_resolves_to_same_entry() {
    let registry = TestRegistry::standard().unwrap();
    let a = registry.resolve(&TestType::from("regression"));
    let b = registry.resolve(&TestType::LinearRegression);
    assert_eq!(a, b);
    assert!(a.validators().contains(&Assumption::Linearity));
}

#[test]
fn test_unknown_test_is_empty_with_note() {
    let registry = TestRegistry::standard().unwrap();
    let r = registry.resolve(&TestType::from("chi_square_goodness"));
    assert!(r.entry().is_none());
    assert!(r.validators().is_empty());
    let note = r.note().unwrap();
    assert_eq!(note.code, "unknown_test_type");
    assert!(note.message.contains("No validators registered"));
}

#[test]
fn test_t_test_alternatives_start_with_mann_whitney() {
    let registry = TestRegistry::standard().unwrap();
    let entry = registry.get(&TestType::TTest).unwrap();
    assert_eq!(entry.alternatives_for(Assumption::Outliers)[0], "mann_whitney");
    assert_eq!(entry.alternatives_for(Assumption::Independence), &[] as &[String]);
}

#[test]
fn test_from_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();
    let registry = TestRegistry::from_toml(file.path()).unwrap();
    let entry = registry.get(&TestType::from("custom_anova")).unwrap();
    assert_eq!(entry.sample_size.minimum, 5);
    assert_eq!(entry.input, InputShape::Groups);
}

#[test]
fn test_missing_file_has_context() {
    let err = TestRegistry::from_toml("/nonexistent/registry.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read registry file"));
}

#[test]
fn test_duplicate_ids_rejected() {
    let doubled = format!("{}\n{}", MINIMAL, MINIMAL);
    let err = TestRegistry::from_toml_str(&doubled).unwrap_err();
    assert_eq!(err.code(), "registry_load_error");
    assert!(err.to_string().contains("duplicate test id"));
}

#[test]
fn test_unknown_assumption_rejected() {
    let toml = r#"
[[test]]
id = "x"
input = "groups"
validators = ["sphericity"]
"#;
    let err = TestRegistry::from_toml_str(toml).unwrap_err();
    assert!(err.to_string().contains("unknown assumption 'sphericity'"));
}

#[test]
fn test_inverted_sample_size_rejected() {
    let toml = r#"
[[test]]
id = "x"
input = "groups"
validators = ["normality"]
sample_size = { minimum = 30, recommended = 10 }
"#;
    assert!(TestRegistry::from_toml_str(toml).is_err());
}

#[test]
fn test_blocking_validator_needs_alternative() {
    let toml = r#"
[[test]]
id = "x"
input = "groups"
validators = ["outliers"]
"#;
    let err = TestRegistry::from_toml_str(toml).unwrap_err();
    assert!(err.to_string().contains("no alternative"));
}

#[test]
fn test_invalid_toml_rejected() {
    assert!(TestRegistry::from_toml_str("[[test]\nid=").is_err());
}

#[test]
fn test_builder_registers_entries() {
    let registry = TestRegistry::builder()
        .register(
            TestRegistryEntry::new("my_test", InputShape::Groups)
                .with_validators(&[Assumption::Normality, Assumption::SampleSize])
                .with_sample_size(2, 8)
                .with_alternatives(Assumption::SampleSize, &["permutation_test"]),
        )
        .build()
        .unwrap();
    assert_eq!(registry.entries().len(), 1);
    assert_eq!(
        registry.resolve(&TestType::from("my_test")).validators(),
        &[Assumption::Normality, Assumption::SampleSize]
    );
}

#[test]
fn test_builder_validates_entries() {
    let result = TestRegistry::builder()
        .register(
            TestRegistryEntry::new("t", InputShape::Groups)
                .with_validators(&[Assumption::Normality, Assumption::Normality]),
        )
        .build();
    assert!(result.is_err());
}
