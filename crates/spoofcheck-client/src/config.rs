use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use spoofcheck_core::{WireFormat, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_FRAME_SIDE};
use thiserror::Error;

/// Largest accepted canonical frame side.
const MAX_FRAME_SIDE: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Client configuration. Fixed once a detector is constructed from it.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Detection endpoint URL (http or https).
    pub endpoint: String,
    /// Sent as the `x-api-key` header.
    pub api_key: String,
    /// Side length of the square canonical frame, in pixels.
    #[serde(default = "default_frame_side")]
    pub frame_side: u32,
    /// Minimum confidence the service should report, and the spoof verdict cut-off.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Request body layout expected by the deployment.
    #[serde(default)]
    pub wire_format: WireFormat,
    /// Per-request timeout in seconds, covering the whole HTTP exchange.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_frame_side() -> u32 {
    DEFAULT_FRAME_SIDE
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("frame_side", &self.frame_side)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("wire_format", &self.wire_format)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with defaults for everything but the endpoint and key.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            frame_side: DEFAULT_FRAME_SIDE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            wire_format: WireFormat::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from `SPOOFCHECK_*` environment variables with defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup("SPOOFCHECK_URL").ok_or(ConfigError::Missing("SPOOFCHECK_URL"))?;
        let api_key =
            lookup("SPOOFCHECK_API_KEY").ok_or(ConfigError::Missing("SPOOFCHECK_API_KEY"))?;

        let config = Self {
            endpoint,
            api_key,
            frame_side: parse_var(&lookup, "SPOOFCHECK_FRAME_SIDE", DEFAULT_FRAME_SIDE)?,
            confidence_threshold: parse_var(
                &lookup,
                "SPOOFCHECK_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            )?,
            wire_format: parse_var(&lookup, "SPOOFCHECK_WIRE_FORMAT", WireFormat::default())?,
            timeout_secs: parse_var(&lookup, "SPOOFCHECK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and the endpoint URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| ConfigError::Invalid {
            key: "endpoint",
            value: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                value: self.endpoint.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.frame_side == 0 || self.frame_side > MAX_FRAME_SIDE {
            return Err(ConfigError::Invalid {
                key: "frame_side",
                value: self.frame_side.to_string(),
                reason: format!("must be between 1 and {MAX_FRAME_SIDE}"),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid {
                key: "confidence_threshold",
                value: self.confidence_threshold.to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                value: "0".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
