use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub recaptcha: RecaptchaConfig,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (0 = number of CPU cores)
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/portal.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Exact origins allowed to make credentialed requests
    pub cors_allowed_origins: Vec<String>,

    /// Regex matched against the Origin header, for hosting-domain
    /// subdomains (e.g. `^https?://([a-z0-9-]+\.)?dinkes\.example$`)
    pub cors_origin_pattern: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8920,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            cors_origin_pattern: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token lifetime
    pub token_ttl_days: i64,

    /// Shared secret required to self-register an admin account.
    /// None disables the check.
    pub admin_code: Option<String>,

    pub throttle: ThrottleConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_days: 7,
            admin_code: None,
            throttle: ThrottleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Failed attempts tolerated per (action, IP) before blocking
    pub max_attempts: u32,

    /// Sliding TTL on the failure counter
    pub window_minutes: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecaptchaConfig {
    /// Verification is disabled entirely when unset
    pub secret_key: Option<String>,

    /// Shared token letting trusted internal callers skip the remote check
    pub bypass_token: Option<String>,

    /// Whether remote-verification failures let the request through
    pub fail_open: bool,

    pub score_threshold: f64,

    pub verify_url: String,
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            bypass_token: None,
            fail_open: false,
            score_threshold: 0.5,
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Content store root; uploaded binaries live under it
    pub root_path: String,

    pub max_upload_bytes: u64,

    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: "storage".to_string(),
            // 200 MB, the public document upload ceiling
            max_upload_bytes: 200 * 1024 * 1024,
            allowed_extensions: [
                "pdf", "doc", "docx", "xls", "xlsx", "csv", "ppt", "pptx", "txt", "rtf", "odt",
                "ods", "odp", "jpg", "jpeg", "jpe", "jfif", "png", "svg", "webp", "zip", "rar",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading config from: {}", path.display());
            return Self::load_from_path(&path);
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if let Some(pattern) = &self.server.cors_origin_pattern {
            regex::Regex::new(pattern)
                .with_context(|| format!("Invalid CORS origin pattern: {pattern}"))?;
        }

        if self.auth.token_ttl_days <= 0 {
            anyhow::bail!("Token TTL must be at least one day");
        }

        Ok(())
    }
}
