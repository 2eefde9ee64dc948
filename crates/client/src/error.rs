use std::io;
use thiserror::Error;

/// Why a submission did not go through. `Display` is the text shown to the user.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("A submission is already in progress")]
    InProgress,

    /// Server answered and refused the submission
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid server response")]
    InvalidResponse,

    #[error("Network error during upload")]
    Network(#[source] reqwest::Error),

    #[error("Could not read archive: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Validation failures never reached the network
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Validation(_) | ClientError::InProgress | ClientError::Io(_))
    }
}
