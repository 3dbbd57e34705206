use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    // A submission is already in flight for this controller
    #[error("A message is already being sent")]
    Busy,

    #[error("{0}")]
    Validation(String),

    /// The server answered with a non-2xx status. `message` carries the
    /// server's `error` field when one was present.
    #[error("HTTP error! status: {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
