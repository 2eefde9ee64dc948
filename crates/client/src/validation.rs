//! Local checks run before any bytes leave the machine

use nexus_core::{AiAnalysisResult, Organization};
use std::path::{Path, PathBuf};

use crate::error::ClientError;

pub const ZIP_MIME: &str = "application/zip";
const ZIP_MIME_ALT: &str = "application/x-zip-compressed";

pub const ZIP_REJECTION: &str = "System Protocol Mismatch: Only .ZIP archives are authorized.";

/// One team's archive addressed to one organization
#[derive(Debug, Clone)]
pub struct Submission {
    pub company: String,
    pub team_name: String,
    pub file: PathBuf,
    /// Media type reported by whatever picked the file, if known
    pub mime_type: Option<String>,
    pub analysis: Option<AiAnalysisResult>,
}

impl Submission {
    pub fn new(company: impl Into<String>, team_name: impl Into<String>, file: impl AsRef<Path>) -> Self {
        Self {
            company: company.into(),
            team_name: team_name.into(),
            file: file.as_ref().to_path_buf(),
            mime_type: None,
            analysis: None,
        }
    }

    pub fn with_analysis(mut self, analysis: Option<AiAnalysisResult>) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

pub fn is_zip(name: &str, mime_type: Option<&str>) -> bool {
    if name.to_ascii_lowercase().ends_with(".zip") {
        return true;
    }
    matches!(mime_type, Some(ZIP_MIME) | Some(ZIP_MIME_ALT))
}

/// Archive type, organization and team name, in that order
pub fn validate(submission: &Submission) -> Result<Organization, ClientError> {
    if !is_zip(&submission.file_name(), submission.mime_type.as_deref()) {
        return Err(ClientError::validation(ZIP_REJECTION));
    }

    let company = submission.company.trim();
    if company.is_empty() {
        return Err(ClientError::validation("Company selection required"));
    }
    let organization = Organization::identify(company)
        .ok_or_else(|| ClientError::validation("Invalid company selection"))?;

    if submission.team_name.trim().is_empty() {
        return Err(ClientError::validation("Team name required"));
    }

    Ok(organization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zip() {
        assert!(is_zip("proj.zip", None));
        assert!(is_zip("Proj.ZIP", Some("application/octet-stream")));
        assert!(is_zip("proj", Some("application/x-zip-compressed")));
        assert!(!is_zip("proj.rar", Some("application/vnd.rar")));
        assert!(!is_zip("proj.zip.exe", None));
    }

    #[test]
    fn test_validate_order() {
        let err = validate(&Submission::new("", "", "slides.pdf")).unwrap_err();
        assert_eq!(err.to_string(), ZIP_REJECTION);

        let err = validate(&Submission::new("  ", "Nullbytes", "proj.zip")).unwrap_err();
        assert_eq!(err.to_string(), "Company selection required");

        let err = validate(&Submission::new("UnknownOrg", "Nullbytes", "proj.zip")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid company selection");

        let err = validate(&Submission::new("Webbed", " ", "proj.zip")).unwrap_err();
        assert_eq!(err.to_string(), "Team name required");
        assert!(err.is_local());

        assert_eq!(
            validate(&Submission::new("techknots", "Nullbytes", "/tmp/proj.zip")).unwrap(),
            Organization::Techknots
        );
    }

    #[test]
    fn test_mime_type_rescues_extensionless_file() {
        let mut submission = Submission::new("Webbed", "Nullbytes", "archive");
        assert!(validate(&submission).is_err());
        submission.mime_type = Some(ZIP_MIME.to_string());
        assert!(validate(&submission).is_ok());
    }
}
