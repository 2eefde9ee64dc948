//! Mock Storage Backend
//!
//! Simulates a successful upload after a size-proportional delay and returns a
//! synthetic link. Never touches the network or the staged file.

use async_trait::async_trait;
use nexus_core::StorageCredentials;
use std::path::Path;
use std::time::Duration;

use crate::backend::{RemoteObject, StorageBackend, StorageSession};
use crate::error::StorageError;
use crate::progress::ProgressReporter;

const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub struct MockStorage {
    max_delay: Duration,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Cap the simulated delay (zero makes uploads instant)
    pub fn with_max_delay(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    /// 1s base plus 10ms per MiB, capped
    pub fn simulated_delay(&self, size: u64) -> Duration {
        let millis = 1000.0 + (size as f64 / (1024.0 * 1024.0)) * 10.0;
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    fn requires_credentials(&self) -> bool {
        false
    }

    fn success_message(&self) -> &'static str {
        "File uploaded successfully (MOCK MODE)"
    }

    async fn authenticate(
        &self,
        _credentials: &StorageCredentials,
    ) -> Result<Box<dyn StorageSession>, StorageError> {
        Ok(Box::new(MockSession {
            storage: self.clone(),
        }))
    }
}

struct MockSession {
    storage: MockStorage,
}

#[async_trait]
impl StorageSession for MockSession {
    async fn stream_upload(
        &self,
        remote_name: &str,
        _local_path: &Path,
        size: u64,
        progress: &ProgressReporter,
    ) -> Result<RemoteObject, StorageError> {
        tracing::info!(
            file = %remote_name,
            "[MOCK MODE] Simulating upload of {:.2} MB",
            size as f64 / (1024.0 * 1024.0)
        );

        tokio::time::sleep(self.storage.simulated_delay(size)).await;
        progress.complete();

        Ok(RemoteObject {
            key: remote_name.to_string(),
            size,
        })
    }

    async fn shareable_link(&self, object: &RemoteObject) -> Result<String, StorageError> {
        let link = mock_link(chrono::Utc::now().timestamp_millis(), &object.key);
        tracing::info!("[MOCK MODE] Mock URL: {}", link);
        Ok(link)
    }

    async fn close(&self) {}
}

pub fn mock_link(timestamp_millis: i64, remote_name: &str) -> String {
    format!(
        "https://mega.nz/mock/{}/{}",
        timestamp_millis,
        urlencoding::encode(remote_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_delay_is_size_proportional_and_capped() {
        let mock = MockStorage::new();
        assert_eq!(mock.simulated_delay(0), Duration::from_millis(1000));
        assert_eq!(mock.simulated_delay(2 * 1024 * 1024), Duration::from_millis(1020));
        assert_eq!(mock.simulated_delay(2 * 1024 * 1024 * 1024), Duration::from_millis(3000));

        let instant = MockStorage::with_max_delay(Duration::ZERO);
        assert_eq!(instant.simulated_delay(50 * 1024 * 1024), Duration::ZERO);
    }

    #[test]
    fn test_mock_link_encodes_name() {
        assert_eq!(
            mock_link(1700000000000, "Nullbytes_2026-10-14T10-00-00-000Z_proj v2.zip"),
            "https://mega.nz/mock/1700000000000/Nullbytes_2026-10-14T10-00-00-000Z_proj%20v2.zip"
        );
    }

    #[tokio::test]
    async fn test_mock_session_completes_progress() {
        let mock = MockStorage::with_max_delay(Duration::ZERO);
        let session = mock.authenticate(&StorageCredentials::default()).await.unwrap();
        let progress = ProgressReporter::new("proj.zip", 4096);

        let object = session
            .stream_upload("proj.zip", Path::new("/does/not/exist.zip"), 4096, &progress)
            .await
            .unwrap();

        assert_eq!(object.key, "proj.zip");
        assert_eq!(progress.percent(), 100);
        let link = session.shareable_link(&object).await.unwrap();
        assert!(link.starts_with("https://mega.nz/mock/"));
        assert!(link.ends_with("/proj.zip"));
    }
}
