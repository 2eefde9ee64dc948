//! AI Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("No API key configured for AI provider")]
    NoApiKey,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response from AI provider")]
    InvalidResponse,

    #[error("AI provider returned no content")]
    EmptyResponse,

    #[error("File content could not be read: {0}")]
    ContentUnreadable(String),
}

impl AiError {
    /// Errors that mean "no analysis" rather than "analysis failed"; the advisor
    /// returns nothing for these instead of the fallback result.
    pub fn is_absent_result(&self) -> bool {
        matches!(self, AiError::NoApiKey | AiError::EmptyResponse)
    }
}
