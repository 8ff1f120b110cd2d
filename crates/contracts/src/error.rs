//! Layered error definitions
//!
//! Categorized by source: config / sample / tracking / storage / session

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Pipeline Errors =====
    /// Malformed producer input, rejected at publish
    #[error("invalid {stream} sample: {message}")]
    InvalidSample { stream: String, message: String },

    /// Relative transform not computable right now
    #[error("tracking unavailable: {message}")]
    TrackingUnavailable { message: String },

    /// Recorder open/write/close failure
    #[error("storage fault on '{target}': {message}")]
    StorageFault { target: String, message: String },

    /// Sensing service connect/session failure
    #[error("session fault: {message}")]
    SessionFault { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_sample(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSample {
            stream: stream.into(),
            message: message.into(),
        }
    }

    pub fn tracking_unavailable(message: impl Into<String>) -> Self {
        Self::TrackingUnavailable {
            message: message.into(),
        }
    }

    /// Create storage fault
    pub fn storage_fault(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageFault {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn session_fault(message: impl Into<String>) -> Self {
        Self::SessionFault {
            message: message.into(),
        }
    }

    /// Session faults end the capture session; everything else is recovered locally
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionFault { .. })
    }
}
