//! Storage Capability Traits
//!
//! A backend authenticates with one organization's credentials and hands back a
//! session; the session streams one file and produces a shareable link.

use async_trait::async_trait;
use nexus_core::StorageCredentials;
use std::path::Path;

use crate::error::StorageError;
use crate::progress::ProgressReporter;

/// An object that landed in remote storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend identifier for logs and health output (e.g. "s3", "mock")
    fn name(&self) -> &str;

    /// Whether empty credentials must be rejected before `authenticate`
    fn requires_credentials(&self) -> bool {
        true
    }

    /// Message reported to the relay on success
    fn success_message(&self) -> &'static str {
        "File uploaded successfully"
    }

    async fn authenticate(
        &self,
        credentials: &StorageCredentials,
    ) -> Result<Box<dyn StorageSession>, StorageError>;
}

#[async_trait]
pub trait StorageSession: Send + Sync {
    /// Stream `local_path` to `remote_name` without buffering the whole file
    async fn stream_upload(
        &self,
        remote_name: &str,
        local_path: &Path,
        size: u64,
        progress: &ProgressReporter,
    ) -> Result<RemoteObject, StorageError>;

    async fn shareable_link(&self, object: &RemoteObject) -> Result<String, StorageError>;

    /// Release the connection. Called once, whether or not the upload succeeded.
    async fn close(&self);
}
