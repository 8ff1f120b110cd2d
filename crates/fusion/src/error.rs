use thiserror::Error;

/// Frame copy-out errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("no fused frame produced yet")]
    NotReady,

    #[error("{buffer} buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall {
        buffer: &'static str,
        needed: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
