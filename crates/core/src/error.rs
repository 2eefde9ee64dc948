//! Configuration Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{organization} is enabled but {variable} is not set")]
    MissingVariable {
        organization: &'static str,
        variable: String,
    },

    #[error("Invalid value for {variable}: {value}")]
    InvalidValue {
        variable: &'static str,
        value: String,
    },
}
