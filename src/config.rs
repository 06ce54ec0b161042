//! Service configuration.
//!
//! [`ServiceConfig`] carries everything the HTTP layer needs to know at
//! startup. The server binary populates it from command-line flags; tests
//! build it directly with [`ServiceConfig::default`] plus field overrides.

use std::path::PathBuf;

/// Runtime configuration for the service.
///
/// All defaults suit local development.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Root directory for transient uploads (default: `uploads`).
    pub uploads_root: PathBuf,
    /// Root directory for extracted frames (default: `frames`).
    pub frames_root: PathBuf,
    /// HTTP request timeout in seconds (default: `300`; frame extraction of
    /// a long video runs within the request).
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes (default: 512 MiB).
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            uploads_root: PathBuf::from("uploads"),
            frames_root: PathBuf::from("frames"),
            request_timeout_secs: 300,
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}
