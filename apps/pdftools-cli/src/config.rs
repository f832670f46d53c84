//! Configuration loading
//!
//! Limits and timing come from an optional TOML file. Every key is optional;
//! anything left out keeps the hosted service's default.

use anyhow::{Context, Result};
use pdftools_core::ClientConfig;
use std::path::{Path, PathBuf};

/// Environment variable holding the server base URL
pub const SERVER_ENV: &str = "PDFTOOLS_SERVER";

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Everything a run needs besides the command itself
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: String,
    pub output_dir: PathBuf,
    pub client: ClientConfig,
}

impl Settings {
    pub fn new(server: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            output_dir: output_dir.into(),
            client: ClientConfig::default(),
        }
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }
}

/// Load client configuration from a TOML file
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ClientConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    from_str(&content)
}

/// Parse client configuration from a TOML string
///
/// # Errors
///
/// Returns an error if the TOML is malformed or a value has the wrong type.
pub fn from_str(s: &str) -> Result<ClientConfig> {
    toml::from_str(s).context("Failed to parse TOML configuration")
}

/// The file's config if a path was given, the defaults otherwise
pub fn load(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => from_file(path),
        None => Ok(ClientConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_empty_file_yields_defaults() {
        assert_eq!(from_str("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = from_str(
            r#"
            max_merge_files = 4

            [timeouts]
            split_ms = 30000

            [progress]
            step = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.max_merge_files, 4);
        assert_eq!(config.max_images, 15);
        assert_eq!(config.progress.step, 5);
        assert_eq!(config.progress.cap, 90);
        assert_eq!(
            config.request_timeout(pdftools_core::FlowKind::Split),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            config.request_timeout(pdftools_core::FlowKind::Merge),
            Some(Duration::from_secs(110))
        );
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        assert!(from_str("max_images = \"lots\"").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_server_url_loses_trailing_slash() {
        let settings = Settings::new("http://localhost:5000/", "out");
        assert_eq!(settings.server, "http://localhost:5000");
    }
}
