//! Integration tests for the stat-guardian binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const OUTLIER_GROUPS: &str = "[[1,1,1,2,2,2,3,100],[1,1,2,2,3,3,4,4]]";
const RIGHT_SKEWED: &str = "[1,1,2,2,2,3,3,4,5,8,13,20]";

fn stat_guardian() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("stat-guardian")
}

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_evaluate_blocked_t_test() {
    stat_guardian()
        .args(["evaluate", "--test", "t_test", "--data", OUTLIER_GROUPS])
        .assert()
        .success()
        .stdout(predicate::str::contains("❌ t_test BLOCKED"))
        .stdout(predicate::str::contains("mann_whitney"))
        .stdout(predicate::str::contains("📊 Group Summaries"));
}

#[test]
fn test_evaluate_strict_exits_with_two_when_blocked() {
    stat_guardian()
        .args(["evaluate", "--test", "t_test", "--strict", "--data", OUTLIER_GROUPS])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("BLOCKED"));
}

#[test]
fn test_evaluate_strict_succeeds_when_test_may_proceed() {
    stat_guardian()
        .args(["evaluate", "--test", "mann_whitney", "--strict", "--data", OUTLIER_GROUPS])
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ mann_whitney MAY PROCEED"));
}

#[test]
fn test_evaluate_json_output_parses() {
    let output = stat_guardian()
        .args([
            "evaluate",
            "--test",
            "t_test",
            "--format",
            "json",
            "--sequential",
            "--data",
            OUTLIER_GROUPS,
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["test_type"], "t_test");
    assert_eq!(parsed["can_proceed"], false);
    assert_eq!(parsed["alternatives"][0]["test_name"], "mann_whitney");
    assert!(parsed["checks"].as_array().unwrap().len() >= 4);
    assert!(parsed.get("visual_evidence").is_none());
}

#[test]
fn test_evaluate_reads_data_file() {
    let data = temp_file(OUTLIER_GROUPS);
    stat_guardian()
        .args(["evaluate", "--test", "anova", "--file"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("anova"));
}

#[test]
fn test_evaluate_unknown_test_is_a_note() {
    stat_guardian()
        .args(["evaluate", "--test", "psychic_test", "--data", OUTLIER_GROUPS])
        .assert()
        .success()
        .stdout(predicate::str::contains("MAY PROCEED"))
        .stdout(predicate::str::contains("unknown_test_type"));
}

#[test]
fn test_evaluate_rejects_bad_data() {
    stat_guardian()
        .args(["evaluate", "--test", "t_test", "--data", "[[1, \"two\"]]"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid data"));
}

#[test]
fn test_evaluate_rejects_bad_alpha() {
    stat_guardian()
        .args(["evaluate", "--test", "t_test", "--alpha", "1.5", "--data", OUTLIER_GROUPS])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alpha"));
}

#[test]
fn test_config_file_sets_default_alpha() {
    let config = temp_file("default_alpha = 0.01\nparallel = false\n");
    stat_guardian()
        .args(["evaluate", "--test", "t_test", "--data", OUTLIER_GROUPS, "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Significance level: 0.01"));
}

#[test]
fn test_invalid_config_file_fails() {
    let config = temp_file("default_alpha = 2.0\n");
    stat_guardian()
        .args(["registry", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_custom_registry_file() {
    let registry = temp_file(
        "[[test]]\nid = \"normal_only\"\ninput = \"groups\"\nvalidators = [\"normality\"]\n",
    );
    stat_guardian()
        .args(["evaluate", "--test", "normal_only", "--data", OUTLIER_GROUPS, "--registry"])
        .arg(registry.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("MAY PROCEED"))
        .stdout(predicate::str::contains("Normality"));
}

#[test]
fn test_suggest_log_for_right_skew() {
    stat_guardian()
        .args(["suggest", "--violation", "normality", "--data", RIGHT_SKEWED])
        .assert()
        .success()
        .stdout(predicate::str::contains("Suggested transform: ln(x)"));
}

#[test]
fn test_suggest_json() {
    let output = stat_guardian()
        .args(["suggest", "--violation", "outliers", "--format", "json", "--data", RIGHT_SKEWED])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["transform"]["kind"], "rank");
}

#[test]
fn test_transform_with_code_emission() {
    stat_guardian()
        .args(["transform", "--kind", "log", "--emit", "python", "--data", RIGHT_SKEWED])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transform: ln(x)"))
        .stdout(predicate::str::contains("(improved)"))
        .stdout(predicate::str::contains("y = np.log(x + 0.0)"));
}

#[test]
fn test_transform_outside_domain_fails() {
    stat_guardian()
        .args(["transform", "--kind", "log", "--offset", "0", "--data", "[-1, 2, 3, 4]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to apply"));
}

#[test]
fn test_registry_lists_builtin_tests() {
    stat_guardian()
        .arg("registry")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered tests (10)"))
        .stdout(predicate::str::contains("t_test"))
        .stdout(predicate::str::contains("kruskal_wallis"));
}

#[test]
fn test_registry_json() {
    let output = stat_guardian()
        .args(["registry", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 10);
}
