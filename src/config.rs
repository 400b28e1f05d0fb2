use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_EXPLANATION_MODEL: &str = "llama-3.2-11b-vision-preview";
pub const DEFAULT_MEDICATION_MODEL: &str = "llama-3.2-90b-vision-preview";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Runtime configuration shared by both binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub explanation_model: String,
    pub medication_model: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub bind_addr: String,
    /// `None` keeps every entry for the lifetime of the process.
    pub history_limit: Option<usize>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenv().ok()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Used by `from_env` and tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let max_tokens = parse_or("MAX_TOKENS", lookup("MAX_TOKENS"), DEFAULT_MAX_TOKENS)?;
        let timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            lookup("REQUEST_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let history_limit = match lookup("HISTORY_LIMIT") {
            Some(raw) => match parse_value::<usize>("HISTORY_LIMIT", &raw)? {
                0 => {
                    return Err(ConfigError::InvalidValue {
                        key: "HISTORY_LIMIT",
                        value: raw,
                    })
                }
                limit => Some(limit),
            },
            None => None,
        };

        Ok(Self {
            api_key,
            api_url: lookup("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            explanation_model: lookup("EXPLANATION_MODEL")
                .unwrap_or_else(|| DEFAULT_EXPLANATION_MODEL.to_string()),
            medication_model: lookup("MEDICATION_MODEL")
                .unwrap_or_else(|| DEFAULT_MEDICATION_MODEL.to_string()),
            max_tokens,
            request_timeout: Duration::from_secs(timeout_secs),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            history_limit,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
