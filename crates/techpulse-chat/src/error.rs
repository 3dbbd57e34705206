use std::time::Duration;
use techpulse_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Language model backend error: {0}")]
    Upstream(String),

    #[error("Language model call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
