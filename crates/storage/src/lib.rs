//! Nexus Storage
//!
//! Streams staged submissions into an organization's remote storage:
//! - Capability traits so the live and mock backends are interchangeable
//! - S3-compatible live backend with multipart streaming
//! - Mock backend for running the relay without credentials
//! - Threshold-based progress reporting

pub mod backend;
pub mod error;
pub mod mock;
pub mod progress;
pub mod s3;
pub mod uploader;

pub use backend::{RemoteObject, StorageBackend, StorageSession};
pub use error::StorageError;
pub use mock::MockStorage;
pub use progress::ProgressReporter;
pub use s3::S3Storage;
pub use uploader::StorageUploader;
