//! Nexus Core
//!
//! Shared data model and configuration for the submission portal:
//! - Organization table and destination resolution
//! - Environment configuration with startup validation
//! - Wire types shared by the relay and the upload client

pub mod config;
pub mod destinations;
pub mod error;
pub mod models;

pub use config::{AppConfig, OperatingMode, StorageSettings};
pub use destinations::{DestinationConfig, DestinationTable};
pub use error::ConfigError;
pub use models::*;
