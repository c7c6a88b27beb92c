//! Configuration management for the client core.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default backend base URL (can be overridden at compile time via KEEPIN_BACKEND_BASE_URL).
pub const DEFAULT_BACKEND_BASE_URL: &str = match option_env!("KEEPIN_BACKEND_BASE_URL") {
    Some(url) => url,
    None => "https://api.keepin.app",
};

/// Default Kakao app key (can be overridden at compile time via KEEPIN_KAKAO_APP_KEY).
const DEFAULT_KAKAO_APP_KEY: &str = match option_env!("KEEPIN_KAKAO_APP_KEY") {
    Some(key) => key,
    None => "dev-kakao-app-key",
};

/// Default Apple service identifier (can be overridden at compile time via KEEPIN_APPLE_CLIENT_ID).
const DEFAULT_APPLE_CLIENT_ID: &str = match option_env!("KEEPIN_APPLE_CLIENT_ID") {
    Some(id) => id,
    None => "app.keepin.signin",
};

/// Default port for the local sign-in callback listener.
const DEFAULT_CALLBACK_PORT: u16 = 9412;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Backend API base URL.
    #[serde(default = "default_backend_base_url")]
    pub backend_base_url: String,
    /// Kakao application key (public, safe to expose).
    #[serde(default = "default_kakao_app_key")]
    pub kakao_app_key: String,
    /// Apple service identifier for Sign in with Apple.
    #[serde(default = "default_apple_client_id")]
    pub apple_client_id: String,
    /// Local port the sign-in callback listener binds to.
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
}

fn default_backend_base_url() -> String {
    DEFAULT_BACKEND_BASE_URL.to_string()
}

fn default_kakao_app_key() -> String {
    DEFAULT_KAKAO_APP_KEY.to_string()
}

fn default_apple_client_id() -> String {
    DEFAULT_APPLE_CLIENT_ID.to_string()
}

fn default_callback_port() -> u16 {
    DEFAULT_CALLBACK_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            kakao_app_key: DEFAULT_KAKAO_APP_KEY.to_string(),
            apple_client_id: DEFAULT_APPLE_CLIENT_ID.to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    ///
    /// The endpoint values (backend URL, provider keys) are compile-time
    /// constants and always use the built-in defaults regardless of what the
    /// config file contains; only log level and callback port come from the
    /// file, and log level can additionally be overridden at runtime.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force compile-time values (never from the config file)
        config.backend_base_url = DEFAULT_BACKEND_BASE_URL.to_string();
        config.kakao_app_key = DEFAULT_KAKAO_APP_KEY.to_string();
        config.apple_client_id = DEFAULT_APPLE_CLIENT_ID.to_string();

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables. Only the log level
    /// can be overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("KEEPIN_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.backend_base_url, DEFAULT_BACKEND_BASE_URL);
        assert_eq!(config.callback_port, DEFAULT_CALLBACK_PORT);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.backend_base_url, DEFAULT_BACKEND_BASE_URL);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.callback_port = 7001;
        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.callback_port, 7001);
    }

    #[test]
    fn test_endpoints_are_compile_time_only() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.backend_base_url = "https://evil.example".to_string();
        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.backend_base_url, DEFAULT_BACKEND_BASE_URL);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"log_level": "debug"}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.callback_port, DEFAULT_CALLBACK_PORT);
    }
}
