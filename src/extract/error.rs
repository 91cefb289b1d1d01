use thiserror::Error;

/// Why a field could not be extracted from model text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("no {field} found in text")]
    NotFound { field: &'static str },

    #[error("malformed {field}: '{input}'")]
    Malformed { field: &'static str, input: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

impl ExtractError {
    pub fn field(&self) -> &'static str {
        match self {
            ExtractError::NotFound { field }
            | ExtractError::Malformed { field, .. }
            | ExtractError::OutOfRange { field, .. } => field,
        }
    }
}
