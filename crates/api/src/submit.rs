use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use chrono::Utc;
use nexus_core::{UploadUrlRequest, UploadUrlResponse};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::error::ApiError;
use crate::staging::{is_zip_upload, remote_file_name, StagedFile};
use crate::AppState;

/// Fields collected from the submission form
#[derive(Debug, Default)]
struct SubmissionForm {
    file: Option<StagedFile>,
    company: Option<String>,
    team_name: Option<String>,
    ai_tags: Option<String>,
    ai_summary: Option<String>,
}

/// Whitespace-only values count as missing
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::Rejected {
        status: e.status(),
        message: e.body_text(),
    }
}

/// Relay one archive to the selected organization's storage
/// POST /api/upload
pub async fn upload_submission(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    // No multipart body means no file
    let multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected upload body: {}", e);
        ApiError::bad_request("No file uploaded")
    })?;

    let mut form = read_submission_form(&state.config.upload_dir, multipart).await?;

    let Some(staged) = form.file.take() else {
        return Err(ApiError::bad_request("No file uploaded"));
    };

    let outcome = relay_submission(&state, &form, &staged).await;

    // Early returns rely on Drop; the normal path removes asynchronously
    staged.cleanup().await;

    outcome
}

async fn relay_submission(
    state: &AppState,
    form: &SubmissionForm,
    staged: &StagedFile,
) -> Result<Json<Value>, ApiError> {
    let company = present(&form.company)
        .ok_or_else(|| ApiError::bad_request("Company selection required"))?;
    let team_name = present(&form.team_name)
        .ok_or_else(|| ApiError::bad_request("Team name required"))?;

    let credentials = state
        .config
        .destinations
        .resolve_credentials(company)
        .ok_or_else(|| ApiError::bad_request("Invalid company selection"))?;

    tracing::info!(
        team = %team_name,
        company = %company,
        file = %staged.original_name(),
        size_bytes = staged.size(),
        ai_tags = present(&form.ai_tags).unwrap_or("N/A"),
        mode = state.config.mode().as_str(),
        "New submission received ({:.2} MB)",
        staged.size() as f64 / (1024.0 * 1024.0)
    );
    if let Some(summary) = present(&form.ai_summary) {
        tracing::debug!("AI summary: {}", summary);
    }

    let remote_name = remote_file_name(team_name, Utc::now(), staged.original_name());

    let result = state
        .uploader
        .upload(credentials, staged.path(), &remote_name, staged.size())
        .await;

    if !result.success {
        return Err(ApiError::UploadFailed(result.message));
    }

    tracing::info!(
        team = %team_name,
        company = %company,
        backend = state.uploader.backend_name(),
        link = result.file_url.as_deref().unwrap_or("-"),
        "Submission relayed"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Project submitted successfully!"
    })))
}

async fn read_submission_form(
    upload_dir: &Path,
    mut multipart: Multipart,
) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                if form.file.is_some() {
                    return Err(ApiError::bad_request("Only one file can be submitted"));
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !is_zip_upload(&file_name, field.content_type()) {
                    return Err(ApiError::bad_request("Only ZIP files are allowed"));
                }
                form.file = Some(stage_field(upload_dir, &file_name, &mut field).await?);
            }
            "company" => form.company = Some(field.text().await.map_err(multipart_error)?),
            "teamName" => form.team_name = Some(field.text().await.map_err(multipart_error)?),
            "aiTags" => form.ai_tags = Some(field.text().await.map_err(multipart_error)?),
            "aiSummary" => form.ai_summary = Some(field.text().await.map_err(multipart_error)?),
            _ if field.file_name().is_some() => {
                return Err(ApiError::bad_request(format!("Unexpected file field: {}", name)));
            }
            _ => tracing::debug!("Ignoring form field {}", name),
        }
    }

    Ok(form)
}

/// Stream one multipart field into a fresh staging file
async fn stage_field(
    upload_dir: &Path,
    file_name: &str,
    field: &mut Field<'_>,
) -> Result<StagedFile, ApiError> {
    let (mut staged, mut file) = StagedFile::create(upload_dir, file_name)
        .await
        .map_err(ApiError::server)?;

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await.map_err(ApiError::server)?;
        size += chunk.len() as u64;
    }
    file.flush().await.map_err(ApiError::server)?;
    drop(file);

    staged.set_size(size);
    Ok(staged)
}

/// Hand out the organization's file-request page instead of relaying bytes
/// POST /api/get-upload-url
pub async fn get_upload_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("Rejected upload-url body: {}", e);
        ApiError::bad_request("Invalid request body")
    })?;

    let company = present(&request.company)
        .ok_or_else(|| ApiError::bad_request("Company selection required"))?;
    let team_name = present(&request.team_name)
        .ok_or_else(|| ApiError::bad_request("Team name required"))?;

    let destination = state
        .config
        .destinations
        .resolve_file_request(company)
        .ok_or_else(|| {
            tracing::error!("No file request URL configured for company: {}", company);
            ApiError::bad_request("Upload not configured for this company")
        })?;

    tracing::info!(team = %team_name, company = %destination.company_name, "Upload URL requested");

    Ok(Json(UploadUrlResponse {
        success: true,
        message: format!(
            "Please upload your file to {}'s upload page",
            destination.company_name
        ),
        file_request_url: destination.file_request_url,
        company_name: destination.company_name,
    }))
}
