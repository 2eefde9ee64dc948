//! Environment Configuration
//!
//! Read once at startup. Handlers only ever see the resulting immutable `AppConfig`.

use std::path::PathBuf;
use std::str::FromStr;

use crate::destinations::DestinationTable;
use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;
const DEFAULT_STORAGE_ENDPOINT: &str = "https://s3.eu-central-1.s4.mega.io";
const DEFAULT_STORAGE_REGION: &str = "eu-central-1";
const DEFAULT_STORAGE_BUCKET: &str = "hackathon-submissions";
/// Presigned links cannot outlive seven days
const MAX_LINK_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Which upload flow this deployment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Clients upload to an externally hosted file-request page
    FileRequest,
    /// Relay accepts files but storage is simulated
    Mock,
    /// Relay streams files to remote storage with stored credentials
    DirectUpload,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::FileRequest => "file-request",
            OperatingMode::Mock => "mock",
            OperatingMode::DirectUpload => "direct-upload",
        }
    }
}

/// S3-compatible endpoint used by the live storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub link_expiry_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub frontend_url: Option<String>,
    pub use_file_request: bool,
    pub mock_mode: bool,
    pub upload_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub storage: StorageSettings,
    pub destinations: DestinationTable,
}

impl AppConfig {
    /// Load `.env` (if present) and then the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let request_timeout_secs = parse_or(
            get("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let max_upload_bytes = parse_or(
            get("MAX_UPLOAD_BYTES"),
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        let link_expiry_secs = parse_or(
            get("LINK_EXPIRY_SECS"),
            "LINK_EXPIRY_SECS",
            MAX_LINK_EXPIRY_SECS,
        )?;
        if link_expiry_secs == 0 || link_expiry_secs > MAX_LINK_EXPIRY_SECS {
            return Err(ConfigError::InvalidValue {
                variable: "LINK_EXPIRY_SECS",
                value: link_expiry_secs.to_string(),
            });
        }

        let storage = StorageSettings {
            endpoint: get("STORAGE_ENDPOINT").unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.to_string()),
            region: get("STORAGE_REGION").unwrap_or_else(|| DEFAULT_STORAGE_REGION.to_string()),
            bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
            link_expiry_secs,
        };

        let destinations = DestinationTable::from_lookup(&lookup, &storage.bucket);

        let config = Self {
            port,
            frontend_url: get("FRONTEND_URL"),
            use_file_request: flag(get("USE_FILE_REQUEST")),
            mock_mode: flag(get("MOCK_MODE")),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            request_timeout_secs,
            max_upload_bytes,
            storage,
            destinations,
        };

        config.destinations.validate(config.mode())?;
        Ok(config)
    }

    pub fn mode(&self) -> OperatingMode {
        if self.use_file_request {
            OperatingMode::FileRequest
        } else if self.mock_mode {
            OperatingMode::Mock
        } else {
            OperatingMode::DirectUpload
        }
    }
}

/// Only the literal `true` (any case) enables a flag
fn flag(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    variable: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            variable,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.request_timeout_secs, 1800);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.storage.bucket, "hackathon-submissions");
        assert_eq!(config.mode(), OperatingMode::DirectUpload);
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(load(&[("MOCK_MODE", "true")]).unwrap().mode(), OperatingMode::Mock);
        assert_eq!(load(&[("MOCK_MODE", "yes")]).unwrap().mode(), OperatingMode::DirectUpload);
        assert_eq!(
            load(&[("USE_FILE_REQUEST", "TRUE"), ("MOCK_MODE", "true")]).unwrap().mode(),
            OperatingMode::FileRequest
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue { variable: "PORT", value: "eighty".to_string() }
        );
    }

    #[test]
    fn test_link_expiry_is_capped() {
        assert!(load(&[("LINK_EXPIRY_SECS", "999999999")]).is_err());
        assert_eq!(load(&[("LINK_EXPIRY_SECS", "3600")]).unwrap().storage.link_expiry_secs, 3600);
    }

    #[test]
    fn test_startup_fails_on_half_configured_organization() {
        let err = load(&[("WEBBED_MEGA_PASSWORD", "secret")]).unwrap_err();
        assert!(err.to_string().contains("WEBBED_MEGA_EMAIL"));

        // Mock mode never needs credentials
        assert!(load(&[("WEBBED_MEGA_PASSWORD", "secret"), ("MOCK_MODE", "true")]).is_ok());
    }
}
