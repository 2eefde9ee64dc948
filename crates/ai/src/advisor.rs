//! Metadata Advisor
//!
//! Wraps a provider with the advisory policy: one attempt per file, and any failure
//! turns into the fixed fallback result. Never blocks a submission.

use nexus_core::AiAnalysisResult;
use std::path::Path;

use crate::content::load_request;
use crate::error::AiError;
use crate::gemini::GeminiProvider;
use crate::provider::{AiProvider, AnalysisRequest};

pub struct MetadataAdvisor {
    provider: Option<Box<dyn AiProvider>>,
}

impl MetadataAdvisor {
    pub fn new(provider: Box<dyn AiProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    /// Gemini when a key is present, disabled otherwise
    pub fn from_api_key(api_key: Option<String>) -> Self {
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => Self::new(Box::new(GeminiProvider::new(key))),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Analyze a file on disk. `mime_type` is inferred from the name when absent.
    pub async fn analyze_file(&self, path: &Path, mime_type: Option<&str>) -> Option<AiAnalysisResult> {
        if self.provider.is_none() {
            tracing::warn!("AI API key is missing. AI features disabled.");
            return None;
        }

        match load_request(path, mime_type).await {
            Ok(request) => self.analyze(&request).await,
            Err(e) => {
                tracing::error!("AI analysis failed: {}", e);
                Some(AiAnalysisResult::fallback())
            }
        }
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Option<AiAnalysisResult> {
        let provider = self.provider.as_ref()?;

        match provider.analyze(request).await {
            Ok(result) => Some(result),
            Err(e) => Self::recover(e),
        }
    }

    fn recover(err: AiError) -> Option<AiAnalysisResult> {
        if err.is_absent_result() {
            tracing::warn!("AI analysis produced no result: {}", err);
            return None;
        }
        tracing::error!("AI analysis failed: {}", err);
        Some(AiAnalysisResult::fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AnalysisContent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behaviour {
        Answer(AiAnalysisResult),
        Fail,
        Empty,
    }

    struct StubProvider {
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AiProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AiAnalysisResult, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Answer(result) => Ok(result.clone()),
                Behaviour::Fail => Err(AiError::NetworkError("connection refused".to_string())),
                Behaviour::Empty => Err(AiError::EmptyResponse),
            }
        }
    }

    fn advisor(behaviour: Behaviour) -> (MetadataAdvisor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider { behaviour, calls: calls.clone() };
        (MetadataAdvisor::new(Box::new(provider)), calls)
    }

    fn archive_request() -> AnalysisRequest {
        AnalysisRequest {
            file_name: "proj.zip".to_string(),
            size_bytes: 2 * 1024 * 1024,
            content: AnalysisContent::Metadata,
        }
    }

    #[tokio::test]
    async fn test_failing_service_yields_fallback() {
        let (advisor, calls) = advisor(Behaviour::Fail);
        let result = advisor.analyze(&archive_request()).await.unwrap();

        assert_eq!(result.tags, vec!["Archive", "Project", "Encrypted"]);
        assert_eq!(result.summary, "Secure archive file ready for transmission.");
        assert_eq!(result.safety_score, 98);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_answer_passes_through() {
        let answer = AiAnalysisResult {
            tags: vec!["Rust".to_string(), "CLI".to_string()],
            summary: "A command line tool".to_string(),
            safety_score: 95,
        };
        let (advisor, _) = advisor(Behaviour::Answer(answer.clone()));
        assert_eq!(advisor.analyze(&archive_request()).await, Some(answer));
    }

    #[tokio::test]
    async fn test_empty_answer_is_none() {
        let (advisor, _) = advisor(Behaviour::Empty);
        assert_eq!(advisor.analyze(&archive_request()).await, None);
    }

    #[tokio::test]
    async fn test_disabled_without_key() {
        let advisor = MetadataAdvisor::from_api_key(Some("  ".to_string()));
        assert!(!advisor.is_enabled());
        assert_eq!(advisor.analyze_file(Path::new("proj.zip"), None).await, None);
    }

    #[tokio::test]
    async fn test_unreadable_file_yields_fallback() {
        let (advisor, calls) = advisor(Behaviour::Fail);
        let result = advisor.analyze_file(Path::new("/no/such/proj.zip"), None).await;
        assert_eq!(result, Some(AiAnalysisResult::fallback()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
