//! Sample store error types

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CacheError {
    /// NaN/negative timestamp or empty/malformed payload
    #[error("invalid {stream} sample: {reason}")]
    InvalidSample {
        stream: &'static str,
        reason: String,
    },
}

impl CacheError {
    pub fn invalid(stream: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSample {
            stream,
            reason: reason.into(),
        }
    }
}

impl From<CacheError> for ContractError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidSample { stream, reason } => {
                ContractError::invalid_sample(stream, reason)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
