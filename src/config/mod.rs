use std::env;
use anyhow::{Result, Context};
use tracing::{info, warn};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub max_concurrent_requests: usize,
    pub model_timeout_seconds: u64,
    pub gemini_model: String,
    pub gemini_api_base: String,
    /// Credential used when a request does not carry its own.
    pub default_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects structured JSON lines.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) if value.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

// Keeps the credential out of startup logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("model_timeout_seconds", &self.model_timeout_seconds)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("default_api_key", &self.default_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            max_file_size_mb: 10,
            max_concurrent_requests: 100,
            model_timeout_seconds: 120,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            default_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let defaults = Config::default();

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| {
                info!("SERVER_HOST not set, using default: {}", defaults.server_host);
                defaults.server_host.clone()
            }),
            server_port: Self::parse_env_var("SERVER_PORT", defaults.server_port)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", defaults.max_file_size_mb)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_concurrent_requests: Self::parse_env_var(
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            )
            .context("Failed to parse MAX_CONCURRENT_REQUESTS")?,
            model_timeout_seconds: Self::parse_env_var(
                "MODEL_TIMEOUT_SECONDS",
                defaults.model_timeout_seconds,
            )
            .context("Failed to parse MODEL_TIMEOUT_SECONDS")?,
            gemini_model: Self::string_env_var("GEMINI_MODEL", &defaults.gemini_model),
            gemini_api_base: Self::string_env_var("GEMINI_API_BASE", &defaults.gemini_api_base)
                .trim_end_matches('/')
                .to_string(),
            default_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        };

        config.validate()?;

        if config.default_api_key.is_none() {
            warn!("GEMINI_API_KEY not set; every request must supply its own credential");
        }

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn string_env_var(var_name: &str, default: &str) -> String {
        match env::var(var_name) {
            Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
            _ => {
                info!("{} not set, using default: {}", var_name, default);
                default.to_string()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_REQUESTS must be greater than 0"));
        }
        if self.model_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("MODEL_TIMEOUT_SECONDS must be greater than 0"));
        }
        if !self.gemini_api_base.starts_with("http://") && !self.gemini_api_base.starts_with("https://") {
            return Err(anyhow::anyhow!("GEMINI_API_BASE must be an http(s) URL"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}
