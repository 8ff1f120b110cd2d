//! Recorder error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

use crate::RecordStream;

/// Record decode errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated {what}: need {needed} bytes, {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("unknown coordinate frame code {0}")]
    UnknownFrame(i32),

    #[error("negative point count {0}")]
    NegativeCount(i32),
}

/// Recorder-specific errors (all are storage faults)
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Write attempted while the stream is closed or disabled
    #[error("{stream} stream not ready")]
    NotReady { stream: RecordStream },

    #[error("failed to create session directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write to {stream} stream failed: {source}")]
    Write {
        stream: RecordStream,
        #[source]
        source: std::io::Error,
    },

    #[error("closing {stream} stream failed: {source}")]
    Close {
        stream: RecordStream,
        #[source]
        source: std::io::Error,
    },

    #[error("recorder already started")]
    AlreadyStarted,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl RecorderError {
    /// Stream (or path) the fault is about, for logs and metrics
    pub fn target(&self) -> String {
        match self {
            Self::NotReady { stream } | Self::Write { stream, .. } | Self::Close { stream, .. } => {
                stream.file_name().to_string()
            }
            Self::CreateDir { path, .. }
            | Self::Open { path, .. }
            | Self::Read { path, .. }
            | Self::Decode { path, .. } => path.display().to_string(),
            Self::AlreadyStarted => "recorder".to_string(),
        }
    }
}

impl RecorderError {
    /// Metric label: the stream, or `session` for directory-level faults
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::NotReady { stream } | Self::Write { stream, .. } | Self::Close { stream, .. } => {
                stream.label()
            }
            _ => "session",
        }
    }
}

impl From<RecorderError> for ContractError {
    fn from(err: RecorderError) -> Self {
        ContractError::storage_fault(err.target(), err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
