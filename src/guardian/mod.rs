// Guardian: pre-flight checks for statistical tests
//
// Resolves the requested test in the registry, derives what each validator
// should see, runs the validators (fan-out/join on scoped threads), and
// folds their checks into a report:
// - can_proceed: no critical violation
// - confidence_score: golden-ratio heuristic over all violations
// - alternatives: registry fallbacks for what was violated
// - notes: everything that could not run, never an error
//
// Evidence rendering is optional, budgeted, and happens after the decision
// is fixed.

mod config;
mod engine;
mod report;
mod views;

pub use config::GuardianConfig;
pub use engine::Guardian;
pub use report::{Alternative, GuardianReport, Note};
