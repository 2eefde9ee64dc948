//! AI Provider Trait
//!
//! Abstract interface for generative-AI providers (Gemini today)

use async_trait::async_trait;
use nexus_core::AiAnalysisResult;

use crate::error::AiError;

/// What gets sent to the provider for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisContent {
    /// Whole image, sent inline
    Image { mime_type: String, data: Vec<u8> },
    /// Leading slice of a text file
    Text(String),
    /// Archives and anything else: only name and size are described
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub file_name: String,
    pub size_bytes: u64,
    pub content: AnalysisContent,
}

impl AnalysisRequest {
    pub fn prompt(&self) -> String {
        let mut prompt = String::from("Analyze this file submission context. ");
        match &self.content {
            AnalysisContent::Image { .. } => {
                prompt.push_str(
                    "Provide 3-5 relevant short tags and a brief summary of the image. Safety score 0-100.",
                );
            }
            AnalysisContent::Text(snippet) => {
                prompt.push_str("Analyze this code/text snippet. Provide tags, summary, and safety score.");
                return format!("File Content snippet:\n{}\n\n{}", snippet, prompt);
            }
            AnalysisContent::Metadata => {
                prompt.push_str(&format!(
                    "The file name is \"{}\" with size {:.2}KB. It is likely a project submission archive. \
                     Generate a professional summary assuming it contains code assets. \
                     Estimate a safety score based on standard archive protocols (high 90s).",
                    self.file_name,
                    self.size_bytes as f64 / 1024.0
                ));
            }
        }
        prompt
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider identifier (e.g., "gemini")
    fn name(&self) -> &str;

    /// Ask for tags, summary and safety score. A single attempt, no retries.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AiAnalysisResult, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_prompt_describes_archive() {
        let request = AnalysisRequest {
            file_name: "proj.zip".to_string(),
            size_bytes: 2048,
            content: AnalysisContent::Metadata,
        };
        let prompt = request.prompt();
        assert!(prompt.starts_with("Analyze this file submission context."));
        assert!(prompt.contains("\"proj.zip\" with size 2.00KB"));
    }

    #[test]
    fn test_text_prompt_leads_with_snippet() {
        let request = AnalysisRequest {
            file_name: "README.md".to_string(),
            size_bytes: 5,
            content: AnalysisContent::Text("# Hi".to_string()),
        };
        assert!(request.prompt().starts_with("File Content snippet:\n# Hi\n\n"));
    }
}
