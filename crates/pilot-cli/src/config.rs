//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pilot_client::DEFAULT_BASE_URL;

/// Configuration for pilot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Send messages with the hands-free flag set
    pub hands_free: Option<bool>,
    /// Write an HTML transcript of each chat session here
    pub transcript_path: Option<String>,
    /// Timeout for the request/response endpoints, in seconds
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pilot")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PILOT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            hands_free: Some(false),
            transcript_path: None,
            request_timeout_secs: Some(30),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Backend URL: command line, then `PILOT_BASE_URL`, then the file,
    /// then the built-in default.
    pub fn base_url(&self, from_args: Option<String>) -> String {
        self.resolve_base_url(from_args, std::env::var("PILOT_BASE_URL").ok())
    }

    fn resolve_base_url(&self, from_args: Option<String>, from_env: Option<String>) -> String {
        from_args
            .or(from_env)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# pilot configuration file
# Place at ~/.config/pilot/config.toml (Linux/Mac) or %APPDATA%\pilot\config.toml (Windows)
# Set PILOT_CONFIG_PATH to use a different file.

# Backend address (PILOT_BASE_URL and --base-url take precedence)
base_url = "http://localhost:5000"

# Let the agent send routine replies without asking for review
hands_free = false

# Keep an HTML transcript of interactive sessions (optional)
# transcript_path = "~/pilot-transcript.html"

# Timeout for non-streaming requests, in seconds (0 disables)
request_timeout_secs = 30
"#
}
