//! Content Classification
//!
//! Decides how much of a file the advisor reads before calling the provider.

use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::error::AiError;
use crate::provider::{AnalysisContent, AnalysisRequest};

/// Characters of a text file sent as context
pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Image,
    Text,
    Other,
}

impl ContentClass {
    pub fn classify(mime_type: &str, file_name: &str) -> Self {
        if mime_type.starts_with("image/") {
            ContentClass::Image
        } else if mime_type == "text/plain"
            || mime_type == "application/json"
            || file_name.ends_with(".md")
        {
            ContentClass::Text
        } else {
            ContentClass::Other
        }
    }
}

/// MIME type from the file extension, for callers that don't have one
pub fn infer_mime(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "json" => "application/json",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

/// First `max_chars` characters, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Read just enough of the file for its content class
pub async fn load_request(path: &Path, mime_type: Option<&str>) -> Result<AnalysisRequest, AiError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mime_type = mime_type.unwrap_or_else(|| infer_mime(&file_name)).to_string();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| AiError::ContentUnreadable(e.to_string()))?;

    let content = match ContentClass::classify(&mime_type, &file_name) {
        ContentClass::Image => {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| AiError::ContentUnreadable(e.to_string()))?;
            AnalysisContent::Image { mime_type, data }
        }
        ContentClass::Text => {
            // UTF-8 needs at most 4 bytes per character
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| AiError::ContentUnreadable(e.to_string()))?;
            let mut buf = Vec::new();
            file.take((MAX_TEXT_CHARS * 4) as u64)
                .read_to_end(&mut buf)
                .await
                .map_err(|e| AiError::ContentUnreadable(e.to_string()))?;
            let text = String::from_utf8_lossy(&buf);
            AnalysisContent::Text(truncate_chars(&text, MAX_TEXT_CHARS).to_string())
        }
        ContentClass::Other => AnalysisContent::Metadata,
    };

    Ok(AnalysisRequest {
        file_name,
        size_bytes: metadata.len(),
        content,
    })
}
