//! Storage Uploader
//!
//! Single entry point used by the relay. Every failure, at any stage, comes back as
//! an unsuccessful `UploadResult`; nothing is thrown to the caller.

use nexus_core::{StorageCredentials, UploadResult};
use std::path::Path;
use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::error::StorageError;
use crate::progress::ProgressReporter;

#[derive(Clone)]
pub struct StorageUploader {
    backend: Arc<dyn StorageBackend>,
}

impl StorageUploader {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn upload(
        &self,
        credentials: &StorageCredentials,
        local_path: &Path,
        remote_name: &str,
        size: u64,
    ) -> UploadResult {
        let progress = ProgressReporter::new(remote_name, size);
        self.upload_with_progress(credentials, local_path, remote_name, size, &progress)
            .await
    }

    /// Same as `upload`, for callers that subscribed to `progress` beforehand
    pub async fn upload_with_progress(
        &self,
        credentials: &StorageCredentials,
        local_path: &Path,
        remote_name: &str,
        size: u64,
        progress: &ProgressReporter,
    ) -> UploadResult {
        if self.backend.requires_credentials() && !credentials.is_complete() {
            tracing::error!(backend = self.backend.name(), "Missing storage credentials");
            return UploadResult::failed(StorageError::MissingCredentials.to_string());
        }

        match self
            .transfer(credentials, local_path, remote_name, size, progress)
            .await
        {
            Ok(link) => UploadResult::succeeded(self.backend.success_message(), Some(link)),
            Err(e) => {
                tracing::error!(backend = self.backend.name(), file = %remote_name, "Upload failed: {}", e);
                UploadResult::failed(e.to_string())
            }
        }
    }

    async fn transfer(
        &self,
        credentials: &StorageCredentials,
        local_path: &Path,
        remote_name: &str,
        size: u64,
        progress: &ProgressReporter,
    ) -> Result<String, StorageError> {
        let session = self.backend.authenticate(credentials).await?;

        let outcome = match session
            .stream_upload(remote_name, local_path, size, progress)
            .await
        {
            Ok(object) => session.shareable_link(&object).await,
            Err(e) => Err(e),
        };

        session.close().await;
        outcome
    }
}
