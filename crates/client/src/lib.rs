//! Nexus Submission Client
//!
//! Validates a team's archive locally, streams it to the relay with progress
//! reporting and turns the relay's answer into a user-facing message.

pub mod client;
pub mod error;
pub mod status;
pub mod validation;

pub use client::{interpret_response, normalize_api_url, SubmissionClient, DEFAULT_API_URL};
pub use error::ClientError;
pub use status::SubmitStatus;
pub use validation::{is_zip, validate, Submission};

/// Initialize tracing for the CLI. Honors `RUST_LOG`, defaults to warnings only
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
