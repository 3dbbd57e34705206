use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    // Microphone unavailable or permission denied; recoverable by retry
    #[error("Audio device unavailable: {message}")]
    Device { message: String },

    // Malformed input, reported immediately, never retried automatically
    #[error("{0}")]
    Validation(String),

    #[error("Transcription upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Transcription call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Audio encoding failed: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
