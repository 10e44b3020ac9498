//! Input model: datasets, test identifiers and validation requests
//!
//! A dataset is either one ordered sample or several groups of samples.
//! Parsing is the only fail-fast step of an evaluation: anything that is
//! not a non-empty array of finite numbers (or of such arrays) is rejected
//! with a `DataFormat` error before any validator runs.

use crate::error::{GuardianError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One or more groups of numeric observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    groups: Vec<Vec<f64>>,
}

impl Dataset {
    /// Single ordered sample
    pub fn single(values: Vec<f64>) -> Result<Self> {
        Self::from_groups(vec![values])
    }

    /// Multi-group dataset; every group must be non-empty and finite
    pub fn from_groups(groups: Vec<Vec<f64>>) -> Result<Self> {
        if groups.is_empty() {
            return Err(GuardianError::data_format("dataset has no groups"));
        }
        for (i, group) in groups.iter().enumerate() {
            if group.is_empty() {
                return Err(GuardianError::data_format(format!(
                    "group {} is empty",
                    i + 1
                )));
            }
            if let Some(pos) = group.iter().position(|v| !v.is_finite()) {
                return Err(GuardianError::data_format(format!(
                    "group {} contains a non-finite value at index {}",
                    i + 1,
                    pos
                )));
            }
        }
        Ok(Self { groups })
    }

    /// Parse `[1, 2, 3]` or `[[1, 2], [3, 4]]`
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(GuardianError::data_format(format!(
                "expected a JSON array, got {}",
                json_kind(value)
            )));
        };
        if items.is_empty() {
            return Err(GuardianError::data_format("dataset is empty"));
        }

        if items.iter().all(Value::is_array) {
            let groups = items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_numbers(item, Some(i + 1)))
                .collect::<Result<Vec<_>>>()?;
            Self::from_groups(groups)
        } else {
            Self::single(parse_numbers(value, None)?)
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| GuardianError::data_format(format!("invalid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn groups(&self) -> &[Vec<f64>] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of observations across groups
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn min_group_len(&self) -> usize {
        self.groups.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// All observations concatenated in group order
    pub fn pooled(&self) -> Vec<f64> {
        self.groups.iter().flatten().copied().collect()
    }
}

fn parse_numbers(value: &Value, group: Option<usize>) -> Result<Vec<f64>> {
    let location = |index: usize| match group {
        Some(g) => format!("group {} index {}", g, index),
        None => format!("index {}", index),
    };
    let Value::Array(items) = value else {
        return Err(GuardianError::data_format("expected an array of numbers"));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_f64().ok_or_else(|| {
                GuardianError::data_format(format!(
                    "non-numeric entry at {}: {}",
                    location(i),
                    json_kind(item)
                ))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Statistical test the caller intends to run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestType {
    TTest,
    PairedTTest,
    Anova,
    Pearson,
    LinearRegression,
    MannWhitney,
    WilcoxonSignedRank,
    KruskalWallis,
    Spearman,
    Bootstrap,
    /// Any identifier without a built-in variant
    Custom(String),
}

impl TestType {
    pub fn id(&self) -> &str {
        match self {
            TestType::TTest => "t_test",
            TestType::PairedTTest => "paired_t_test",
            TestType::Anova => "anova",
            TestType::Pearson => "pearson",
            TestType::LinearRegression => "linear_regression",
            TestType::MannWhitney => "mann_whitney",
            TestType::WilcoxonSignedRank => "wilcoxon_signed_rank",
            TestType::KruskalWallis => "kruskal_wallis",
            TestType::Spearman => "spearman",
            TestType::Bootstrap => "bootstrap",
            TestType::Custom(name) => name,
        }
    }
}

impl From<&str> for TestType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "t_test" | "ttest" | "independent_t_test" => TestType::TTest,
            "paired_t_test" | "paired_ttest" => TestType::PairedTTest,
            "anova" | "one_way_anova" => TestType::Anova,
            "pearson" | "pearson_correlation" => TestType::Pearson,
            "linear_regression" | "regression" => TestType::LinearRegression,
            "mann_whitney" | "mann_whitney_u" => TestType::MannWhitney,
            "wilcoxon_signed_rank" | "wilcoxon" => TestType::WilcoxonSignedRank,
            "kruskal_wallis" => TestType::KruskalWallis,
            "spearman" | "spearman_correlation" => TestType::Spearman,
            "bootstrap" => TestType::Bootstrap,
            other => TestType::Custom(other.to_string()),
        }
    }
}

impl From<String> for TestType {
    fn from(s: String) -> Self {
        TestType::from(s.as_str())
    }
}

impl From<TestType> for String {
    fn from(t: TestType) -> Self {
        t.id().to_string()
    }
}

impl FromStr for TestType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(TestType::from(s))
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single request to the guardian
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub data: Dataset,
    pub test_type: TestType,
    pub alpha: f64,
}

impl ValidationRequest {
    /// Build a request, rejecting alpha outside (0, 1)
    pub fn new(data: Dataset, test_type: impl Into<TestType>, alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(GuardianError::data_format(format!(
                "alpha must be in (0, 1), got {}",
                alpha
            )));
        }
        Ok(Self {
            data,
            test_type: test_type.into(),
            alpha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_group() {
        let ds = Dataset::from_json(&json!([1.0, 2, 3.5])).unwrap();
        assert_eq!(ds.group_count(), 1);
        assert_eq!(ds.groups()[0], vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn test_parse_multi_group() {
        let ds = Dataset::from_json_str("[[1,2,3],[4,5]]").unwrap();
        assert_eq!(ds.group_count(), 2);
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.min_group_len(), 2);
    }

    #[test]
    fn test_rejects_non_numeric() {
        let err = Dataset::from_json(&json!([1, "two", 3])).unwrap_err();
        assert_eq!(err.code(), "data_format_error");
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_rejects_empty_input_and_groups() {
        assert!(Dataset::from_json(&json!([])).is_err());
        assert!(Dataset::from_json(&json!([[1, 2], []])).is_err());
        assert!(Dataset::from_json(&json!({"a": 1})).is_err());
        assert!(Dataset::from_json_str("not json").is_err());
    }

    #[test]
    fn test_rejects_mixed_nesting() {
        assert!(Dataset::from_json(&json!([[1, 2], 3])).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(Dataset::single(vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_test_type_round_trip() {
        assert_eq!(TestType::from("regression"), TestType::LinearRegression);
        assert_eq!(TestType::from("Mann_Whitney"), TestType::MannWhitney);
        assert_eq!(
            TestType::from("chi_square"),
            TestType::Custom("chi_square".to_string())
        );
        assert_eq!(TestType::TTest.to_string(), "t_test");
    }

    #[test]
    fn test_request_alpha_bounds() {
        let ds = Dataset::single(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(ValidationRequest::new(ds.clone(), TestType::TTest, 0.05).is_ok());
        assert!(ValidationRequest::new(ds.clone(), TestType::TTest, 0.0).is_err());
        assert!(ValidationRequest::new(ds, TestType::TTest, 1.0).is_err());
    }
}
