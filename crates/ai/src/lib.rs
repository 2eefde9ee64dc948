//! Nexus AI Module
//!
//! Advisory metadata (tags, summary, safety score) for a selected submission file:
//! - Provider abstraction for generative-AI backends
//! - Content classification (image, text, everything else)
//! - Fallback policy so AI failures never block a submission

pub mod advisor;
pub mod content;
pub mod error;
pub mod gemini;
pub mod provider;

pub use advisor::MetadataAdvisor;
pub use content::ContentClass;
pub use error::AiError;
pub use gemini::GeminiProvider;
pub use provider::{AiProvider, AnalysisContent, AnalysisRequest};
