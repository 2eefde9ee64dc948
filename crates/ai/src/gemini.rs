//! Gemini Provider Implementation

use async_trait::async_trait;
use base64::Engine;
use nexus_core::AiAnalysisResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AiError;
use crate::provider::{AiProvider, AnalysisContent, AnalysisRequest};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiProvider {
    api_key: String,
    client: Client,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

// Gemini API request/response types
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Shape the model is asked to answer in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    tags: Vec<String>,
    summary: String,
    safety_score: i64,
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
            "summary": { "type": "STRING" },
            "safetyScore": { "type": "INTEGER" }
        },
        "required": ["tags", "summary", "safetyScore"]
    })
}

fn build_request(request: &AnalysisRequest) -> GenerateRequest {
    let prompt = request.prompt();
    let parts = match &request.content {
        AnalysisContent::Image { mime_type, data } => vec![
            Part::Inline {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                },
            },
            Part::Text { text: prompt },
        ],
        AnalysisContent::Text(_) | AnalysisContent::Metadata => vec![Part::Text { text: prompt }],
    };

    GenerateRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    }
}

/// Parse the model's JSON answer; the safety score is clamped to 0-100
fn parse_analysis(text: &str) -> Result<AiAnalysisResult, AiError> {
    let raw: RawAnalysis = serde_json::from_str(text).map_err(|_| AiError::InvalidResponse)?;
    Ok(AiAnalysisResult {
        tags: raw.tags,
        summary: raw.summary,
        safety_score: raw.safety_score.clamp(0, 100) as u8,
    })
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AiAnalysisResult, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NoApiKey);
        }

        let body = build_request(request);

        let response = self.client
            .post(format!("{}/models/{}:generateContent", GEMINI_API_URL, self.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini generateContent error: {} - {}", status, error_text);
            return Err(AiError::ProviderError(format!("Gemini API error: {}", status)));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|_| AiError::InvalidResponse)?;

        let text: String = generated.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }

        parse_analysis(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_request_inlines_base64() {
        let request = AnalysisRequest {
            file_name: "logo.png".to_string(),
            size_bytes: 3,
            content: AnalysisContent::Image {
                mime_type: "image/png".to_string(),
                data: vec![1, 2, 3],
            },
        };
        let json = serde_json::to_value(build_request(&request)).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert!(parts[1]["text"].as_str().unwrap().contains("3-5 relevant short tags"));
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["required"][2], "safetyScore");
    }

    #[test]
    fn test_archive_request_is_text_only() {
        let request = AnalysisRequest {
            file_name: "proj.zip".to_string(),
            size_bytes: 1024,
            content: AnalysisContent::Metadata,
        };
        let json = serde_json::to_value(build_request(&request)).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0]["text"].as_str().unwrap().contains("proj.zip"));
    }

    #[test]
    fn test_parse_analysis_clamps_score() {
        let result = parse_analysis(r#"{"tags":["Rust"],"summary":"CLI tool","safetyScore":140}"#).unwrap();
        assert_eq!(result.safety_score, 100);
        assert_eq!(result.tags, vec!["Rust".to_string()]);

        let low = parse_analysis(r#"{"tags":[],"summary":"","safetyScore":-3}"#).unwrap();
        assert_eq!(low.safety_score, 0);
    }

    #[test]
    fn test_parse_analysis_rejects_garbage() {
        assert!(matches!(parse_analysis("not json"), Err(AiError::InvalidResponse)));
        assert!(matches!(parse_analysis(r#"{"tags":["a"]}"#), Err(AiError::InvalidResponse)));
    }

    #[tokio::test]
    async fn test_empty_key_short_circuits() {
        let provider = GeminiProvider::new(String::new());
        let request = AnalysisRequest {
            file_name: "proj.zip".to_string(),
            size_bytes: 1,
            content: AnalysisContent::Metadata,
        };
        assert!(matches!(provider.analyze(&request).await, Err(AiError::NoApiKey)));
    }
}
