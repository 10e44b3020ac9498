use super::boxcox::LAMBDA_ZERO;
use super::Transform;
use crate::error::GuardianError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language for [`emit_code`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CodeTarget {
    /// numpy / scipy
    Python,
    R,
    /// this crate
    Rust,
}

impl FromStr for CodeTarget {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(CodeTarget::Python),
            "r" => Ok(CodeTarget::R),
            "rust" | "rs" => Ok(CodeTarget::Rust),
            other => Err(GuardianError::InvalidConfig(format!(
                "unknown code target '{}' (expected python, r or rust)",
                other
            ))),
        }
    }
}

impl fmt::Display for CodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeTarget::Python => "python",
            CodeTarget::R => "r",
            CodeTarget::Rust => "rust",
        };
        write!(f, "{}", name)
    }
}

/// Snippet that reproduces `transform` and its back-transformation
///
/// Deterministic: the same transform and target always give the same text.
/// Input is a variable named `x`, output `y`.
pub fn emit_code(transform: &Transform, target: CodeTarget) -> String {
    match target {
        CodeTarget::Python => python(transform),
        CodeTarget::R => r(transform),
        CodeTarget::Rust => rust(transform),
    }
}

fn python(transform: &Transform) -> String {
    let body = match *transform {
        Transform::Log { offset } => format!(
            "y = np.log(x + {o:?})\n# back-transform\nx_back = np.exp(y) - {o:?}\n",
            o = offset
        ),
        Transform::Sqrt { offset } => format!(
            "y = np.sqrt(x + {o:?})\n# back-transform\nx_back = y ** 2 - {o:?}\n",
            o = offset
        ),
        Transform::BoxCox { lambda, offset } => format!(
            "from scipy import stats\nfrom scipy.special import inv_boxcox\n\n\
             y = stats.boxcox(x + {o:?}, lmbda={l:?})\n# back-transform\nx_back = inv_boxcox(y, {l:?}) - {o:?}\n",
            o = offset,
            l = lambda
        ),
        Transform::Inverse { offset } => format!(
            "y = 1.0 / ({o:?} - x)\n# back-transform\nx_back = {o:?} - 1.0 / y\n",
            o = offset
        ),
        Transform::Rank => "from scipy import stats\n\n\
             ranks = stats.rankdata(x)\ny = stats.norm.ppf((ranks - 0.375) / (len(x) + 0.25))\n\
             # back-transform: interpolate from sorted scores to sorted x\n\
             x_back = np.interp(y, np.sort(y), np.sort(x))\n"
            .to_string(),
    };
    format!("import numpy as np\n\nx = np.asarray(x, dtype=float)\n# {}\n{}", transform, body)
}

fn r(transform: &Transform) -> String {
    let body = match *transform {
        Transform::Log { offset } => format!(
            "y <- log(x + {o:?})\n# back-transform\nx_back <- exp(y) - {o:?}\n",
            o = offset
        ),
        Transform::Sqrt { offset } => format!(
            "y <- sqrt(x + {o:?})\n# back-transform\nx_back <- y^2 - {o:?}\n",
            o = offset
        ),
        Transform::BoxCox { lambda, offset } if lambda.abs() < LAMBDA_ZERO => format!(
            "y <- log(x + {o:?})\n# back-transform\nx_back <- exp(y) - {o:?}\n",
            o = offset
        ),
        Transform::BoxCox { lambda, offset } => format!(
            "lambda <- {l:?}\ny <- ((x + {o:?})^lambda - 1) / lambda\n\
             # back-transform\nx_back <- (lambda * y + 1)^(1 / lambda) - {o:?}\n",
            o = offset,
            l = lambda
        ),
        Transform::Inverse { offset } => format!(
            "y <- 1 / ({o:?} - x)\n# back-transform\nx_back <- {o:?} - 1 / y\n",
            o = offset
        ),
        Transform::Rank => "y <- qnorm((rank(x) - 0.375) / (length(x) + 0.25))\n\
             # back-transform: interpolate from sorted scores to sorted x\n\
             x_back <- approx(sort(y), sort(x), xout = y, rule = 2, ties = mean)$y\n"
            .to_string(),
    };
    format!("# {}\n{}", transform, body)
}

fn rust(transform: &Transform) -> String {
    let ctor = match *transform {
        Transform::Log { offset } => format!("Transform::Log {{ offset: {:?} }}", offset),
        Transform::Sqrt { offset } => format!("Transform::Sqrt {{ offset: {:?} }}", offset),
        Transform::BoxCox { lambda, offset } => format!(
            "Transform::BoxCox {{ lambda: {:?}, offset: {:?} }}",
            lambda, offset
        ),
        Transform::Inverse { offset } => format!("Transform::Inverse {{ offset: {:?} }}", offset),
        Transform::Rank => "Transform::Rank".to_string(),
    };
    format!(
        "use stat_guardian::transform::{{apply, Transform}};\n\n\
         // {}\nlet transformed = apply(&x, {})?;\nlet y = &transformed.values;\n\
         // back-transform\nlet x_back = transformed.inverse.invert_all(y);\n",
        transform, ctor
    )
}
