//! S3-compatible Storage Backend
//!
//! Works with any S3-compatible provider (MEGA S4 by default, AWS, MinIO, etc.).
//! Each organization authenticates with its own access key pair.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use nexus_core::{StorageCredentials, StorageSettings};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use crate::backend::{RemoteObject, StorageBackend, StorageSession};
use crate::error::StorageError;
use crate::progress::ProgressReporter;

/// Size of each multipart chunk read from disk (S3 minimum is 5 MiB)
const PART_SIZE: usize = 8 * 1024 * 1024;
const ZIP_CONTENT_TYPE: &str = "application/zip";

pub struct S3Storage {
    endpoint: String,
    region: String,
    link_expiry: Duration,
}

impl S3Storage {
    pub fn new(settings: &StorageSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            region: settings.region.clone(),
            link_expiry: Duration::from_secs(settings.link_expiry_secs),
        }
    }

    async fn client_for(&self, credentials: &StorageCredentials) -> Client {
        let provider = Credentials::new(
            credentials.email.clone(),
            credentials.password.clone(),
            None,
            None,
            "nexus-destination",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(provider)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(self.endpoint.clone())
            .force_path_style(true)
            .build();
        Client::from_conf(config)
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn name(&self) -> &str {
        "s3"
    }

    async fn authenticate(
        &self,
        credentials: &StorageCredentials,
    ) -> Result<Box<dyn StorageSession>, StorageError> {
        tracing::info!(
            endpoint = %self.endpoint,
            bucket = %credentials.bucket,
            "Connecting as {}...",
            credentials.masked_email()
        );

        let client = self.client_for(credentials).await;

        // HeadBucket is the cheapest call that proves the key pair is valid
        client
            .head_bucket()
            .bucket(&credentials.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Authentication(DisplayErrorContext(&e).to_string()))?;

        tracing::info!(bucket = %credentials.bucket, "Connected successfully");

        Ok(Box::new(S3Session {
            client,
            bucket: credentials.bucket.clone(),
            link_expiry: self.link_expiry,
        }))
    }
}

struct S3Session {
    client: Client,
    bucket: String,
    link_expiry: Duration,
}

impl S3Session {
    async fn put_empty(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(ZIP_CONTENT_TYPE)
            .body(ByteStream::from(Vec::new()))
            .send()
            .await
            .map_err(|e| StorageError::Transfer(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn upload_parts(
        &self,
        file: &mut tokio::fs::File,
        key: &str,
        upload_id: &str,
        progress: &ProgressReporter,
    ) -> Result<Vec<CompletedPart>, StorageError> {
        let mut parts = Vec::new();
        let mut part_number: i32 = 1;

        loop {
            let chunk = read_chunk(file, PART_SIZE).await?;
            if chunk.is_empty() {
                break;
            }
            let chunk_len = chunk.len() as u64;

            let response = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(|e| StorageError::Transfer(DisplayErrorContext(&e).to_string()))?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(response.e_tag().map(str::to_string))
                    .build(),
            );

            progress.advance(chunk_len);
            part_number += 1;
        }

        Ok(parts)
    }

    async fn abort(&self, key: &str, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            tracing::warn!(key = %key, "Failed to abort multipart upload: {}", DisplayErrorContext(&e));
        }
    }
}

#[async_trait]
impl StorageSession for S3Session {
    async fn stream_upload(
        &self,
        remote_name: &str,
        local_path: &Path,
        size: u64,
        progress: &ProgressReporter,
    ) -> Result<RemoteObject, StorageError> {
        let mut file = tokio::fs::File::open(local_path).await?;

        tracing::info!(
            file = %remote_name,
            bucket = %self.bucket,
            "Uploading {:.2} MB...",
            size as f64 / (1024.0 * 1024.0)
        );

        if size == 0 {
            self.put_empty(remote_name).await?;
            progress.complete();
            return Ok(RemoteObject { key: remote_name.to_string(), size });
        }

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(remote_name)
            .content_type(ZIP_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| StorageError::Transfer(DisplayErrorContext(&e).to_string()))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::Transfer("provider returned no upload id".to_string()))?
            .to_string();

        let parts = match self.upload_parts(&mut file, remote_name, &upload_id, progress).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(remote_name, &upload_id).await;
                return Err(e);
            }
        };

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        if let Err(e) = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(remote_name)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
        {
            self.abort(remote_name, &upload_id).await;
            return Err(StorageError::Transfer(DisplayErrorContext(&e).to_string()));
        }

        progress.complete();
        tracing::info!(file = %remote_name, "Upload complete");

        Ok(RemoteObject {
            key: remote_name.to_string(),
            size: progress.transferred(),
        })
    }

    /// Presigned GET; valid for the configured link lifetime
    async fn shareable_link(&self, object: &RemoteObject) -> Result<String, StorageError> {
        let presigning_config = PresigningConfig::expires_in(self.link_expiry)
            .map_err(|e| StorageError::Link(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::Link(DisplayErrorContext(&e).to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn close(&self) {
        tracing::debug!(bucket = %self.bucket, "Storage session closed");
    }
}

/// Fill up to `limit` bytes from `reader`. Short only at end of file.
async fn read_chunk<R>(reader: &mut R, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}
