use futures::StreamExt;
use nexus_core::{ApiMessage, Organization, UploadUrlRequest, UploadUrlResponse};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;

use crate::error::ClientError;
use crate::status::SubmitStatus;
use crate::validation::{validate, Submission, ZIP_MIME};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Bare hosts get `https://`; trailing slashes are dropped
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Map a relay response to the message shown to the user.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<String, ClientError> {
    if status.is_success() {
        let parsed: ApiMessage =
            serde_json::from_str(body).map_err(|_| ClientError::InvalidResponse)?;
        let message = parsed.message.filter(|m| !m.is_empty());
        return if parsed.success {
            Ok(message.unwrap_or_default())
        } else {
            Err(ClientError::Rejected(
                message.unwrap_or_else(|| "Upload failed".to_string()),
            ))
        };
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Server Error ({})", status.as_u16()));
            Err(ClientError::Rejected(message))
        }
        Err(_) => Err(ClientError::Rejected(
            format!(
                "Server Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
        )),
    }
}

/// Held while a submission is in flight
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ClientError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| ClientError::InProgress)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SubmissionClient {
    http: Client,
    api_url: String,
    in_flight: AtomicBool,
    status: Arc<watch::Sender<SubmitStatus>>,
}

impl SubmissionClient {
    pub fn new(api_url: &str) -> Self {
        Self::with_client(Client::new(), api_url)
    }

    pub fn with_client(http: Client, api_url: &str) -> Self {
        let (status, _) = watch::channel(SubmitStatus::Idle);
        Self {
            http,
            api_url: normalize_api_url(api_url),
            in_flight: AtomicBool::new(false),
            status: Arc::new(status),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Status text updates for the current submission
    pub fn subscribe(&self) -> watch::Receiver<SubmitStatus> {
        self.status.subscribe()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn publish(&self, status: SubmitStatus) {
        self.status.send_replace(status);
    }

    /// Send one archive to the relay. Resolves with the relay's message.
    ///
    /// Validation happens before any network call. Only one submission may be in
    /// flight per client; failures are never retried.
    pub async fn submit(&self, submission: &Submission) -> Result<String, ClientError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let organization = validate(submission)?;

        match self.send_submission(submission, organization).await {
            Ok(message) => {
                self.publish(SubmitStatus::Finalizing);
                tracing::info!(team = %submission.team_name.trim(), company = %organization, "Submission accepted");
                Ok(message)
            }
            Err(e) => {
                self.publish(SubmitStatus::Idle);
                tracing::warn!("Submission failed: {}", e);
                Err(e)
            }
        }
    }

    async fn send_submission(
        &self,
        submission: &Submission,
        organization: Organization,
    ) -> Result<String, ClientError> {
        self.publish(SubmitStatus::Preparing);

        let file = tokio::fs::File::open(&submission.file).await?;
        let size = file.metadata().await?.len();
        let form = self.build_form(submission, organization, file, size)?;

        self.publish(SubmitStatus::Uploading);

        let response = self
            .http
            .post(format!("{}/api/upload", self.api_url))
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::Network)?;
        interpret_response(status, &body)
    }

    fn build_form(
        &self,
        submission: &Submission,
        organization: Organization,
        file: tokio::fs::File,
        size: u64,
    ) -> Result<Form, ClientError> {
        let status = self.status.clone();
        let mut sent: u64 = 0;
        let stream = ReaderStream::new(file).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                sent += bytes.len() as u64;
                let next = SubmitStatus::from_bytes(sent, size);
                status.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    *current = next;
                    true
                });
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), size)
            .file_name(submission.file_name())
            .mime_str(ZIP_MIME)
            .map_err(ClientError::Network)?;

        let mut form = Form::new()
            .part("file", part)
            .text("company", organization.display_name())
            .text("teamName", submission.team_name.trim().to_string());

        if let Some(analysis) = &submission.analysis {
            if !analysis.tags.is_empty() {
                form = form.text("aiTags", analysis.joined_tags());
            }
            if !analysis.summary.is_empty() {
                form = form.text("aiSummary", analysis.summary.clone());
            }
        }

        Ok(form)
    }

    /// File-request mode: ask the relay for the organization's upload page
    pub async fn request_upload_url(
        &self,
        company: &str,
        team_name: &str,
    ) -> Result<UploadUrlResponse, ClientError> {
        let request = UploadUrlRequest {
            company: Some(company.to_string()),
            team_name: Some(team_name.to_string()),
        };

        let response = self
            .http
            .post(format!("{}/api/get-upload-url", self.api_url))
            .json(&request)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::Network)?;

        if status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<UploadUrlResponse>(&body) {
                if parsed.success {
                    return Ok(parsed);
                }
            }
        }

        // Success without a usable URL is still a bad answer
        interpret_response(status, &body)?;
        Err(ClientError::InvalidResponse)
    }
}
