//! Storage Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Server configuration error: Missing storage credentials")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Could not read staged file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Could not create shareable link: {0}")]
    Link(String),
}
