//! Environment-sourced server configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default upstream API base URL.
pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com";

/// How the server reaches the upstream model.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpstreamMode {
    /// Call the real model API.
    Live,
    /// Serve a canned analysis without network access.
    Mock,
}

/// Startup configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is unset or empty.
    Missing(&'static str),
    /// A key holds an unusable value.
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key} must be set"),
            Self::Invalid { key, value } => write!(f, "{key} has an invalid value: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the upstream model.
    pub google_api_key: String,
    /// PostgreSQL connection string for the history store.
    pub database_url: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Directory holding `index.html` and static assets.
    pub static_dir: PathBuf,
    /// Origins allowed by CORS.
    pub ui_origins: Vec<String>,
    /// Upstream API base URL.
    pub upstream_url: String,
    /// Upstream mode.
    pub upstream_mode: UpstreamMode,
}

impl Settings {
    /// Load settings from the process environment.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &'static str| value(key).ok_or(ConfigError::Missing(key));

        let google_api_key = required("GOOGLE_API_KEY")?;
        let database_url = required("DATABASE_URL")?;

        let port = match value("BUGAI_PORT") {
            Some(raw) => u16::from_str(&raw).map_err(|_| ConfigError::Invalid {
                key: "BUGAI_PORT",
                value: raw,
            })?,
            None => 8000,
        };

        let upstream_mode = match value("BUGAI_UPSTREAM_MODE") {
            None => UpstreamMode::Live,
            Some(raw) if raw.eq_ignore_ascii_case("live") => UpstreamMode::Live,
            Some(raw) if raw.eq_ignore_ascii_case("mock") => UpstreamMode::Mock,
            Some(raw) => {
                return Err(ConfigError::Invalid {
                    key: "BUGAI_UPSTREAM_MODE",
                    value: raw,
                });
            }
        };

        let ui_origins = value("BUGAI_UI_ORIGINS")
            .unwrap_or_else(|| "http://127.0.0.1:8000,http://localhost:8000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            google_api_key,
            database_url,
            host: value("BUGAI_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            static_dir: value("BUGAI_STATIC_DIR")
                .map_or_else(|| PathBuf::from("static"), PathBuf::from),
            ui_origins,
            upstream_url: value("BUGAI_UPSTREAM_URL")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            upstream_mode,
        })
    }
}
