//! Destination Resolver
//!
//! Maps an organization identifier to its storage destination. The table is built once
//! at startup from the environment and never changes afterwards.

use crate::config::OperatingMode;
use crate::error::ConfigError;
use crate::models::{FileRequestDestination, Organization, StorageCredentials};

/// Everything the relay knows about one organization's destination
#[derive(Debug, Clone)]
pub struct DestinationConfig {
    pub organization: Organization,
    pub file_request_url: Option<String>,
    pub credentials: StorageCredentials,
}

impl DestinationConfig {
    /// An organization is enabled as soon as any of its variables is set
    pub fn is_enabled(&self) -> bool {
        self.file_request_url.is_some()
            || !self.credentials.email.is_empty()
            || !self.credentials.password.is_empty()
    }

    fn require(&self, mode: OperatingMode) -> Result<(), ConfigError> {
        let prefix = self.organization.env_prefix();
        let missing = |suffix: &str| ConfigError::MissingVariable {
            organization: self.organization.display_name(),
            variable: format!("{}_{}", prefix, suffix),
        };

        match mode {
            OperatingMode::Mock => Ok(()),
            OperatingMode::FileRequest => match self.file_request_url {
                Some(_) => Ok(()),
                None => Err(missing("FILE_REQUEST_URL")),
            },
            OperatingMode::DirectUpload => {
                if self.credentials.email.is_empty() {
                    return Err(missing("MEGA_EMAIL"));
                }
                if self.credentials.password.is_empty() {
                    return Err(missing("MEGA_PASSWORD"));
                }
                Ok(())
            }
        }
    }
}

/// Organization → destination table, one entry per known organization
#[derive(Debug, Clone)]
pub struct DestinationTable {
    entries: Vec<DestinationConfig>,
}

impl DestinationTable {
    pub fn new(entries: Vec<DestinationConfig>) -> Self {
        Self { entries }
    }

    /// Read `<ORG>_FILE_REQUEST_URL`, `<ORG>_MEGA_EMAIL`, `<ORG>_MEGA_PASSWORD` and
    /// `<ORG>_STORAGE_BUCKET` for every organization. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, default_bucket: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: String| lookup(&key).filter(|v| !v.trim().is_empty());

        let entries = Organization::ALL
            .into_iter()
            .map(|organization| {
                let prefix = organization.env_prefix();
                DestinationConfig {
                    organization,
                    file_request_url: read(format!("{}_FILE_REQUEST_URL", prefix)),
                    credentials: StorageCredentials {
                        email: read(format!("{}_MEGA_EMAIL", prefix)).unwrap_or_default(),
                        password: read(format!("{}_MEGA_PASSWORD", prefix)).unwrap_or_default(),
                        bucket: read(format!("{}_STORAGE_BUCKET", prefix))
                            .unwrap_or_else(|| default_bucket.to_string()),
                    },
                }
            })
            .collect();

        Self { entries }
    }

    /// Fail fast when an enabled organization lacks a variable the active mode needs
    pub fn validate(&self, mode: OperatingMode) -> Result<(), ConfigError> {
        let mut enabled = 0;
        for entry in self.entries.iter().filter(|e| e.is_enabled()) {
            entry.require(mode)?;
            enabled += 1;
        }

        if enabled == 0 && mode != OperatingMode::Mock {
            tracing::warn!(
                mode = mode.as_str(),
                "No organization has a destination configured; every submission will fail"
            );
        }
        Ok(())
    }

    pub fn resolve(&self, identifier: &str) -> Option<&DestinationConfig> {
        let organization = Organization::identify(identifier)?;
        self.entries.iter().find(|e| e.organization == organization)
    }

    /// Direct-upload mode. Known organizations always resolve, even when their
    /// credentials are empty; the uploader reports that as a configuration error.
    pub fn resolve_credentials(&self, identifier: &str) -> Option<&StorageCredentials> {
        self.resolve(identifier).map(|entry| &entry.credentials)
    }

    /// File-request mode. Unknown organizations and missing URLs both resolve to `None`.
    pub fn resolve_file_request(&self, identifier: &str) -> Option<FileRequestDestination> {
        let entry = self.resolve(identifier)?;
        let url = entry.file_request_url.as_ref()?;
        Some(FileRequestDestination {
            file_request_url: url.clone(),
            company_name: entry.organization.display_name().to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DestinationConfig> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(vars: &[(&str, &str)]) -> DestinationTable {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DestinationTable::from_lookup(|key| map.get(key).cloned(), "submissions")
    }

    #[test]
    fn test_resolve_credentials_for_known_organization() {
        let table = table(&[
            ("WEBBED_MEGA_EMAIL", "ops@webbed.io"),
            ("WEBBED_MEGA_PASSWORD", "secret"),
            ("WEBBED_STORAGE_BUCKET", "webbed-subs"),
        ]);

        let creds = table.resolve_credentials("webbed").unwrap();
        assert_eq!(creds.email, "ops@webbed.io");
        assert_eq!(creds.bucket, "webbed-subs");

        let sene = table.resolve_credentials("Senesense Solutions").unwrap();
        assert!(!sene.is_complete());
        assert_eq!(sene.bucket, "submissions");
    }

    #[test]
    fn test_unknown_organization_resolves_to_none() {
        let table = table(&[("WEBBED_FILE_REQUEST_URL", "https://mega.nz/filerequest/abc")]);
        for id in ["UnknownOrg", "UNKNOWNORG", "my-unknownorg-team", "Mega"] {
            assert!(table.resolve_credentials(id).is_none(), "{}", id);
            assert!(table.resolve_file_request(id).is_none(), "{}", id);
        }
    }

    #[test]
    fn test_resolve_file_request() {
        let table = table(&[("WEBBED_FILE_REQUEST_URL", "https://mega.nz/filerequest/abc")]);

        let dest = table.resolve_file_request("WEBBED").unwrap();
        assert_eq!(dest.file_request_url, "https://mega.nz/filerequest/abc");
        assert_eq!(dest.company_name, "Webbed");

        // Known but not configured
        assert!(table.resolve_file_request("Techknots").is_none());
    }

    #[test]
    fn test_validate_direct_upload_requires_password() {
        let table = table(&[("TECHKNOTS_MEGA_EMAIL", "ops@techknots.dev")]);
        let err = table.validate(OperatingMode::DirectUpload).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingVariable {
                organization: "Techknots",
                variable: "TECHKNOTS_MEGA_PASSWORD".to_string(),
            }
        );
        assert!(table.validate(OperatingMode::Mock).is_ok());
    }

    #[test]
    fn test_validate_file_request_mode() {
        let table = table(&[
            ("SENESENSE_FILE_REQUEST_URL", "https://mega.nz/filerequest/s"),
            ("WEBBED_MEGA_EMAIL", "ops@webbed.io"),
            ("WEBBED_MEGA_PASSWORD", "secret"),
        ]);
        let err = table.validate(OperatingMode::FileRequest).unwrap_err();
        assert!(err.to_string().contains("WEBBED_FILE_REQUEST_URL"));
    }

    #[test]
    fn test_validate_nothing_configured_is_allowed() {
        let table = table(&[]);
        assert!(table.validate(OperatingMode::DirectUpload).is_ok());
        assert!(table.iter().all(|e| !e.is_enabled()));
    }
}
