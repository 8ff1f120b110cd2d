//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Sensing service connection failed or broke down
    #[error("Session fault: {message}")]
    SessionFault { message: String },

    /// A capture thread could not be started
    #[error("Failed to start {component}: {message}")]
    Startup { component: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn session_fault(message: impl Into<String>) -> Self {
        Self::SessionFault {
            message: message.into(),
        }
    }

    pub fn startup(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Startup {
            component: component.into(),
            message: message.into(),
        }
    }
}
