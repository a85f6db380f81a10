use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enum for the errors raised at the edges of the normalizer.
#[derive(Debug, Clone, Error, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConvError {
    #[error("Unsupported result type: {0}")]
    UnsupportedResultType(String),

    #[error("Malformed {0} payload. {1}")]
    MalformedPayload(String, String),

    #[error("Invalid number. {0}")]
    InvalidNumber(String),

    #[error("Invalid timestamp. {0}")]
    InvalidTimestamp(String),

    #[error("Invalid configuration. {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse template {0}: {1}")]
    TemplateParse(String, String),

    #[error("Failure executing template {0}: {1}")]
    TemplateExecution(String, String),

    #[error("{0}")]
    Generic(String),
}

pub type ConvResult<T> = Result<T, ConvError>;

impl From<serde_json::Error> for ConvError {
    fn from(err: serde_json::Error) -> Self {
        ConvError::Generic(err.to_string())
    }
}
