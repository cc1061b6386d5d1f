//! Configuration file support for decisio
//!
//! Reads from .decisio/config.toml, then applies environment overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP API configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind. Default: "127.0.0.1"
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on. Default: 8000
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of request-handling threads. Default: 4
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Path prefix for the REST routes. Default: "/api/v1"
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Browser origins allowed to call the API
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite file. When unset the nearest .decisio/decisio.db is used.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum pooled connections. Default: 5
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long a request may wait on a locked database or a busy pool, in
    /// milliseconds. Default: 5000
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_workers() -> usize {
    4
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

fn default_pool_size() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            api_prefix: default_api_prefix(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Load config from .decisio/config.toml plus environment overrides.
    /// Falls back to defaults if the file is missing or unreadable.
    pub fn load() -> Self {
        let mut config = match Self::find_config_path() {
            Some(path) => match std::fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|contents| Self::from_toml_str(&contents))
            {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "ignoring unreadable config"
                    );
                    Self::default()
                }
            },
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".decisio").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Apply DECISIO_* overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DECISIO_DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("DECISIO_CORS_ORIGINS") {
            self.server.cors_origins = parse_cors_origins(&raw);
        }
        if let Some(raw) = lookup("DECISIO_PORT") {
            match raw.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid DECISIO_PORT"),
            }
        }
    }
}

impl ServerConfig {
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_origins.iter().any(|o| o == "*" || o == origin)
    }

    /// Address to bind, as host:port
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse an origin list given either as a JSON array
/// (`["https://a.example","https://b.example"]`) or comma-separated.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with('[') {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
            return values
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    trimmed
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
