//! CLI argument parsing for stat-guardian

use crate::dataset::Dataset;
use crate::transform::{CodeTarget, TransformKind};
use crate::validators::Assumption;
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "stat-guardian")]
#[command(version)]
#[command(about = "Validate and repair the assumptions behind statistical tests", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Guardian configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check every registered assumption of a test against the data
    Evaluate(EvaluateArgs),

    /// Recommend a transform for data that failed an assumption
    Suggest(SuggestArgs),

    /// Apply a transform, re-check normality and optionally emit code
    Transform(TransformArgs),

    /// List registered tests and their validators
    Registry {
        /// Registry file (TOML) replacing the built-in registry
        #[arg(long, value_name = "PATH")]
        registry: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Inline JSON or a file holding it
///
/// Accepts a flat array (one group) or an array of arrays (several groups).
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct DataSource {
    /// Data as JSON, e.g. '[[1,2,3],[4,5,6]]'
    #[arg(long, value_name = "JSON")]
    pub data: Option<String>,

    /// File containing the JSON data
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl DataSource {
    pub fn load(&self) -> anyhow::Result<Dataset> {
        let (content, origin) = match (&self.data, &self.file) {
            (Some(json), _) => (json.clone(), "--data".to_string()),
            (None, Some(path)) => (
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read data file: {}", path.display()))?,
                path.display().to_string(),
            ),
            (None, None) => anyhow::bail!("Must specify either --data JSON or --file PATH"),
        };
        Dataset::from_json_str(&content).with_context(|| format!("Invalid data in {}", origin))
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Test identifier, e.g. t_test, anova, pearson
    #[arg(long = "test", value_name = "ID")]
    pub test: String,

    /// Significance level (defaults to the configured default_alpha)
    #[arg(long, value_name = "ALPHA")]
    pub alpha: Option<f64>,

    #[command(flatten)]
    pub source: DataSource,

    /// Registry file (TOML) replacing the built-in registry
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Run validators one after another instead of on scoped threads
    #[arg(long)]
    pub sequential: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Exit with status 2 when the test may not proceed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Violated assumption, e.g. normality, outliers, modality
    #[arg(long, value_name = "ASSUMPTION", value_parser = parse_assumption)]
    pub violation: Assumption,

    #[command(flatten)]
    pub source: DataSource,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Transform to apply: log, sqrt, boxcox, inverse or rank
    #[arg(long, value_name = "KIND")]
    pub kind: TransformKind,

    /// Shift added before transforming (default: smallest valid shift)
    #[arg(long, value_name = "OFFSET", allow_negative_numbers = true)]
    pub offset: Option<f64>,

    /// Box-Cox lambda (default: maximum likelihood)
    #[arg(long, value_name = "LAMBDA", allow_negative_numbers = true)]
    pub lambda: Option<f64>,

    #[command(flatten)]
    pub source: DataSource,

    /// Emit a reproducible snippet in this language
    #[arg(long, value_enum, value_name = "LANG")]
    pub emit: Option<CodeTarget>,

    /// Significance level for the before/after normality check
    #[arg(long, value_name = "ALPHA", default_value = "0.05")]
    pub alpha: f64,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

fn parse_assumption(s: &str) -> Result<Assumption, String> {
    Assumption::parse(s).ok_or_else(|| {
        let known: Vec<&str> = Assumption::ALL.iter().map(|a| a.id()).collect();
        format!("unknown assumption '{}' (expected one of: {})", s, known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::parse_from([
            "stat-guardian",
            "evaluate",
            "--test",
            "t_test",
            "--data",
            "[[1,2,3],[4,5,6]]",
        ]);
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.test, "t_test");
        assert_eq!(args.alpha, None);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.sequential);
        assert!(!args.strict);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "stat-guardian",
            "evaluate",
            "--test",
            "anova",
            "--file",
            "data.json",
            "--debug",
            "--config",
            "guardian.toml",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("guardian.toml")));
    }

    #[test]
    fn test_cli_requires_exactly_one_data_source() {
        assert!(Cli::try_parse_from(["stat-guardian", "evaluate", "--test", "t_test"]).is_err());
        assert!(Cli::try_parse_from([
            "stat-guardian",
            "evaluate",
            "--test",
            "t_test",
            "--data",
            "[1,2,3]",
            "--file",
            "x.json",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_suggest_violation() {
        let cli = Cli::parse_from(["stat-guardian", "suggest", "--violation", "outliers", "--data", "[1,2,3]"]);
        let Command::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        assert_eq!(args.violation, Assumption::Outliers);

        assert!(Cli::try_parse_from(["stat-guardian", "suggest", "--violation", "vibes", "--data", "[1]"]).is_err());
    }

    #[test]
    fn test_cli_transform_options() {
        let cli = Cli::parse_from([
            "stat-guardian",
            "transform",
            "--kind",
            "boxcox",
            "--offset",
            "-2.5",
            "--lambda",
            "0.5",
            "--data",
            "[1,2,3]",
            "--emit",
            "python",
        ]);
        let Command::Transform(args) = cli.command else {
            panic!("expected transform");
        };
        assert_eq!(args.kind, TransformKind::BoxCox);
        assert_eq!(args.offset, Some(-2.5));
        assert_eq!(args.lambda, Some(0.5));
        assert_eq!(args.emit, Some(CodeTarget::Python));
        assert_eq!(args.alpha, 0.05);
    }

    #[test]
    fn test_cli_registry_defaults() {
        let cli = Cli::parse_from(["stat-guardian", "registry"]);
        let Command::Registry { registry, format } = cli.command else {
            panic!("expected registry");
        };
        assert!(registry.is_none());
        assert_eq!(format, OutputFormat::Text);
    }

    #[test]
    fn test_data_source_load() {
        let inline = DataSource {
            data: Some("[[1,2],[3,4]]".to_string()),
            file: None,
        };
        assert_eq!(inline.load().unwrap().group_count(), 2);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[5, 6, 7]").unwrap();
        let from_file = DataSource {
            data: None,
            file: Some(file.path().to_path_buf()),
        };
        assert_eq!(from_file.load().unwrap().len(), 3);

        let missing = DataSource {
            data: None,
            file: Some(PathBuf::from("/nonexistent/data.json")),
        };
        let err = missing.load().unwrap_err();
        assert!(err.to_string().contains("Failed to read data file"));

        let bad = DataSource {
            data: Some("{\"not\": \"data\"}".to_string()),
            file: None,
        };
        assert!(bad.load().unwrap_err().to_string().contains("Invalid data"));
    }
}
