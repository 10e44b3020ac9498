use anyhow::{Context, Result};
use clap::Parser;
use stat_guardian::cli::{Cli, Command, EvaluateArgs, OutputFormat, SuggestArgs, TransformArgs};
use stat_guardian::transform::{self, emit_code, Transform};
use stat_guardian::{Guardian, GuardianConfig, TestRegistry, ValidationRequest};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit status for `evaluate --strict` when the test is blocked
const EXIT_BLOCKED: i32 = 2;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<GuardianConfig> {
    match path {
        Some(path) => GuardianConfig::from_file(path),
        None => Ok(GuardianConfig::default()),
    }
}

fn load_registry(path: Option<&PathBuf>) -> Result<TestRegistry> {
    match path {
        Some(path) => TestRegistry::from_toml(path),
        None => TestRegistry::standard().context("Failed to load built-in registry"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Returns whether the test may proceed
fn run_evaluate(args: EvaluateArgs, mut config: GuardianConfig) -> Result<bool> {
    if args.sequential {
        config.parallel = false;
    }
    let registry = load_registry(args.registry.as_ref())?;
    let guardian = Guardian::new(Arc::new(registry)).with_config(config);

    let data = args.source.load()?;
    let alpha = args.alpha.unwrap_or(guardian.config().default_alpha);
    let request = ValidationRequest::new(data, args.test.as_str(), alpha)?;
    let report = guardian.evaluate(&request)?;

    match args.format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(report.can_proceed)
}

fn run_suggest(args: SuggestArgs) -> Result<()> {
    let data = args.source.load()?;
    let suggestion = transform::suggest(&data.pooled(), args.violation)?;

    match args.format {
        OutputFormat::Text => {
            println!("💡 Suggested transform: {}", suggestion.transform);
            println!("   Rationale: {}", suggestion.rationale);
            println!(
                "   Expected skewness reduction: {:.1}%",
                suggestion.expected_improvement * 100.0
            );
        }
        OutputFormat::Json => print_json(&suggestion)?,
    }
    Ok(())
}

fn run_transform(args: TransformArgs) -> Result<()> {
    let data = args.source.load()?;
    let values = data.pooled();
    let chosen = Transform::fit(args.kind, &values, args.offset, args.lambda)?;
    let transformed = transform::apply(&values, chosen)
        .with_context(|| format!("Failed to apply {}", chosen))?;
    let validation = transform::validate(&values, &transformed.values, args.alpha)?;
    let code = args.emit.map(|target| emit_code(&chosen, target));

    match args.format {
        OutputFormat::Text => {
            println!("🔧 Transform: {}", transformed.transform);
            println!(
                "   Shapiro-Wilk p: {:.4} -> {:.4} ({})",
                validation.before_p,
                validation.after_p,
                if validation.improved { "improved" } else { "not improved" }
            );
            println!("   Improvement score: {:.1}/100", validation.improvement_score);
            println!("   Values: {:?}", transformed.values);
            if let Some(code) = code {
                println!();
                print!("{}", code);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "transformed": transformed,
            "validation": validation,
            "code": code,
        }))?,
    }
    Ok(())
}

fn run_registry(path: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let registry = load_registry(path.as_ref())?;
    match format {
        OutputFormat::Text => {
            println!("📋 Registered tests ({})", registry.len());
            println!("─────────────────────────────────────────");
            for entry in registry.entries() {
                let validators: Vec<&str> = entry.validators.iter().map(|a| a.id()).collect();
                println!("{:<22} {}", entry.test_type.id(), entry.description);
                if validators.is_empty() {
                    println!("{:<22} validators: (none)", "");
                } else {
                    println!("{:<22} validators: {}", "", validators.join(", "));
                }
            }
        }
        OutputFormat::Json => print_json(&registry.entries())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Evaluate(eval) => {
            let strict = eval.strict;
            let can_proceed = run_evaluate(eval, config)?;
            if strict && !can_proceed {
                std::io::stdout().flush()?;
                std::process::exit(EXIT_BLOCKED);
            }
        }
        Command::Suggest(suggest) => run_suggest(suggest)?,
        Command::Transform(transform) => run_transform(transform)?,
        Command::Registry { registry, format } => run_registry(registry, format)?,
    }

    Ok(())
}
