//! Visual evidence seam
//!
//! The guardian never renders anything itself. An injected
//! [`EvidenceRenderer`] turns `(data, check)` into an encoded artifact (Q-Q
//! plot, histogram, KDE overlay, box plot) and the report embeds the
//! returned reference. Rendering happens after the decision is fixed, so a
//! failing or slow renderer cannot change `can_proceed`.

use crate::dataset::Dataset;
use crate::validators::Assumption;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to a rendered artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Plot kind, e.g. "qq_plot" or "histogram"
    pub kind: String,
    /// MIME type of `content`
    pub media_type: String,
    /// Encoded artifact or a URI pointing to it
    pub content: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvidenceError {
    /// Renderer intentionally produces nothing; not reported
    #[error("evidence rendering disabled")]
    Disabled,

    #[error("no renderer for check '{0}'")]
    Unsupported(String),

    #[error("rendering failed: {0}")]
    Failed(String),
}

/// Produces visual evidence for one assumption check
pub trait EvidenceRenderer: Send + Sync {
    fn render(&self, data: &Dataset, check: Assumption) -> Result<EvidenceRef, EvidenceError>;
}

/// Renderer that never produces evidence
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl EvidenceRenderer for NoopRenderer {
    fn render(&self, _data: &Dataset, _check: Assumption) -> Result<EvidenceRef, EvidenceError> {
        Err(EvidenceError::Disabled)
    }
}

/// Default plot kind for each assumption
pub fn plot_kind(check: Assumption) -> &'static str {
    match check {
        Assumption::Normality => "qq_plot",
        Assumption::VarianceHomogeneity | Assumption::Outliers => "box_plot",
        Assumption::Modality => "kde_overlay",
        Assumption::Independence => "lag_plot",
        Assumption::Linearity => "residual_plot",
        Assumption::SampleSize => "histogram",
    }
}
