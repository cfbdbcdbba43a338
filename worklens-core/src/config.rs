//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "bindAddress": "0.0.0.0", "port": 8080, "demoMode": false, "sessionTtlSecs": 86400 }
//! }
//! ```
//! Environment variables override the file for CI and container setups.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;
use crate::services::DEFAULT_SESSION_TTL_SECS;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    bind_address: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    demo_mode: bool,
    #[serde(default)]
    session_ttl_secs: Option<u64>,
}

/// Worklens configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    /// Demo mode runs against a separate throwaway database file
    pub demo_mode: bool,
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            demo_mode: false,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// Precedence: environment variables (`WORKLENS_PORT`,
    /// `WORKLENS_DEMO_MODE`), then settings.json, then defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let port = match std::env::var("WORKLENS_PORT").ok().and_then(|v| v.parse().ok()) {
            Some(port) => port,
            None => raw.app.port.unwrap_or(DEFAULT_PORT),
        };

        let demo_mode = match std::env::var("WORKLENS_DEMO_MODE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        Ok(Self {
            bind_address: raw
                .app
                .bind_address
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            demo_mode,
            session_ttl_secs: raw.app.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS),
        })
    }

    /// Database filename for the current mode
    pub fn db_filename(&self) -> &'static str {
        if self.demo_mode {
            "demo.duckdb"
        } else {
            "worklens.duckdb"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.demo_mode);
        assert_eq!(config.db_filename(), "worklens.duckdb");
    }

    #[test]
    fn test_settings_file_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"app": {"bindAddress": "127.0.0.1", "port": 9999, "demoMode": true, "sessionTtlSecs": 60}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 9999);
        assert!(config.demo_mode);
        assert_eq!(config.session_ttl_secs, 60);
        assert_eq!(config.db_filename(), "demo.duckdb");
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
