// Test registry: which assumptions each statistical test depends on
//
// Selective validation keeps assumption-light tests quiet: rank-based tests
// register no validators, correlation and resampling tests only
// independence, and parametric tests the full applicable set. Entries are
// configuration, not code, so new tests need no recompilation.
//
// Scientific Foundation:
// [1] Field, A. (2013). Discovering Statistics Using IBM SPSS Statistics
//     (4th ed.), chapters 5 and 9 (assumptions of parametric tests).
// [2] Wilcox, R. R. (2012). Introduction to Robust Estimation and
//     Hypothesis Testing (3rd ed.). Academic Press.

mod catalog;
mod definition;

pub use catalog::{Resolution, TestRegistry, TestRegistryBuilder};
pub use definition::{InputShape, TestRegistryEntry};

#[cfg(test)]
mod tests;
