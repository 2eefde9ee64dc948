//! Data Models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hackathon-sponsoring organization. Each one owns its own storage destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Organization {
    Senesense,
    Webbed,
    Techknots,
}

impl Organization {
    /// Checked in this order when matching identifiers.
    pub const ALL: [Organization; 3] = [
        Organization::Senesense,
        Organization::Webbed,
        Organization::Techknots,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Organization::Senesense => "Senesense Solutions",
            Organization::Webbed => "Webbed",
            Organization::Techknots => "Techknots",
        }
    }

    /// Prefix of the organization's environment variables (e.g. `WEBBED_MEGA_EMAIL`)
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Organization::Senesense => "SENESENSE",
            Organization::Webbed => "WEBBED",
            Organization::Techknots => "TECHKNOTS",
        }
    }

    fn match_key(&self) -> &'static str {
        match self {
            Organization::Senesense => "senesense",
            Organization::Webbed => "webbed",
            Organization::Techknots => "techknots",
        }
    }

    /// Case-insensitive substring match against the known organizations.
    /// "Senesense Solutions", "webbed" and "team-TECHKNOTS-2" all resolve.
    pub fn identify(identifier: &str) -> Option<Organization> {
        let lower = identifier.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|org| lower.contains(org.match_key()))
    }

    pub fn display_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|org| org.display_name()).collect()
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Account credentials for one organization's storage destination.
/// `email` is the account identifier and `password` its secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageCredentials {
    pub email: String,
    pub password: String,
    pub bucket: String,
}

impl StorageCredentials {
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }

    /// Account identifier safe for logs: first three characters only
    pub fn masked_email(&self) -> String {
        let prefix: String = self.email.chars().take(3).collect();
        format!("{}***", prefix)
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("email", &self.masked_email())
            .field("password", &"••••")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Externally hosted upload page for file-request mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequestDestination {
    pub file_request_url: String,
    pub company_name: String,
}

/// Terminal outcome of one storage upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl UploadResult {
    pub fn succeeded(message: impl Into<String>, file_url: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            file_url,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            file_url: None,
        }
    }
}

/// Advisory metadata produced by the AI advisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysisResult {
    pub tags: Vec<String>,
    pub summary: String,
    pub safety_score: u8,
}

impl AiAnalysisResult {
    /// Used whenever the AI service fails
    pub fn fallback() -> Self {
        Self {
            tags: vec![
                "Archive".to_string(),
                "Project".to_string(),
                "Encrypted".to_string(),
            ],
            summary: "Secure archive file ready for transmission.".to_string(),
            safety_score: 98,
        }
    }

    /// Form value for the `aiTags` multipart field
    pub fn joined_tags(&self) -> String {
        self.tags.join(", ")
    }
}

/// `{success, message}` body returned by every relay endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/get-upload-url`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub company: Option<String>,
    pub team_name: Option<String>,
}

/// Successful response of `POST /api/get-upload-url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub success: bool,
    pub file_request_url: String,
    pub company_name: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_is_case_insensitive_substring() {
        assert_eq!(Organization::identify("Webbed"), Some(Organization::Webbed));
        assert_eq!(Organization::identify("SENESENSE SOLUTIONS"), Some(Organization::Senesense));
        assert_eq!(Organization::identify("team-techknots-2024"), Some(Organization::Techknots));
    }

    #[test]
    fn test_identify_unknown() {
        assert_eq!(Organization::identify("UnknownOrg"), None);
        assert_eq!(Organization::identify(""), None);
        assert_eq!(Organization::identify("web bed"), None);
        assert_eq!(Organization::identify("sene-sense"), None);
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = StorageCredentials {
            email: "judge@webbed.io".to_string(),
            password: "hunter2".to_string(),
            bucket: "subs".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("jud***"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("judge@webbed.io"));
    }

    #[test]
    fn test_analysis_result_wire_format() {
        let json = serde_json::to_value(AiAnalysisResult::fallback()).unwrap();
        assert_eq!(json["safetyScore"], 98);
        assert_eq!(json["tags"][2], "Encrypted");
        assert_eq!(AiAnalysisResult::fallback().joined_tags(), "Archive, Project, Encrypted");
    }
}
