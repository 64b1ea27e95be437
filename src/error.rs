use thiserror::Error;

use crate::world::diagnostic::Diagnostic;

/// Everything that can go wrong while building or running a world. None of
/// these are transient; the same configuration fails the same way every time.
#[derive(Error, Debug)]
pub enum DiagError {
    #[error("invalid configuration parameter `{param}`: {reason}")]
    Configuration { param: &'static str, reason: String },

    #[error("diagnostic {diagnostic:?} produced non-finite fitness {value} for organism {index}")]
    Evaluation {
        index: usize,
        diagnostic: Diagnostic,
        value: f64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse configuration: {0}")]
    Parse(#[from] serde_yml::Error),
}

impl DiagError {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> DiagError {
        DiagError::Configuration {
            param,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiagError>;
