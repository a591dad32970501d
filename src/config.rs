//! Orchestrator configuration.
//!
//! Loaded from a TOML file (default `boundary-orchestrator.toml`):
//!
//! ```toml
//! [krypton]
//! mode = "binary"                              # "binary" | "http"
//! binary_path = "entropy_health"
//! http_url = "http://127.0.0.1:3000/health"
//! # binary_timeout_seconds = 5.0               # unset: wait for the producer indefinitely
//!
//! [scheduler]
//! throttle_sleep_seconds = 0.5
//!
//! [jobs]
//! submit_url = "http://127.0.0.1:3000/jobs"
//! ```
//!
//! A missing file yields [`OrchestratorConfig::default`]; missing keys take
//! their individual defaults. Components never read configuration on their
//! own: the composition root loads it once and passes the pieces down.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, ErrorContext, Result};

pub const DEFAULT_CONFIG_PATH: &str = "boundary-orchestrator.toml";

/// Environment variable that overrides the default config path.
pub const CONFIG_PATH_ENV: &str = "BOUNDARY_ORCHESTRATOR_CONFIG";

/// How the health producer is reached.
///
/// Unrecognized values are kept verbatim instead of failing the load; the
/// health client reports them when it is asked for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportMode {
    Binary,
    Http,
    Other(String),
}

impl From<String> for TransportMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "binary" => TransportMode::Binary,
            "http" => TransportMode::Http,
            _ => TransportMode::Other(s),
        }
    }
}

impl From<&str> for TransportMode {
    fn from(s: &str) -> Self {
        TransportMode::from(s.to_string())
    }
}

impl From<TransportMode> for String {
    fn from(mode: TransportMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Binary => f.write_str("binary"),
            TransportMode::Http => f.write_str("http"),
            TransportMode::Other(s) => f.write_str(s),
        }
    }
}

/// `[krypton]`: where the health signal comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KryptonConfig {
    pub mode: TransportMode,
    pub binary_path: PathBuf,
    pub http_url: String,
    pub binary_timeout_seconds: Option<f64>,
}

impl Default for KryptonConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Binary,
            binary_path: PathBuf::from("entropy_health"),
            http_url: "http://127.0.0.1:3000/health".to_string(),
            binary_timeout_seconds: None,
        }
    }
}

impl KryptonConfig {
    pub fn binary(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: TransportMode::Binary,
            binary_path: path.into(),
            ..Self::default()
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self {
            mode: TransportMode::Http,
            http_url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_binary_timeout(mut self, timeout: Duration) -> Self {
        self.binary_timeout_seconds = Some(timeout.as_secs_f64());
        self
    }

    pub fn binary_timeout(&self) -> Option<Duration> {
        self.binary_timeout_seconds
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

/// `[scheduler]`: gate policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Backoff applied before running a job under `Throttle`.
    pub throttle_sleep_seconds: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            throttle_sleep_seconds: 0.5,
        }
    }
}

impl GateConfig {
    pub fn new(throttle_sleep_seconds: f64) -> Self {
        Self {
            throttle_sleep_seconds,
        }
    }

    /// Backoff as a `Duration`; invalid values (negative, NaN) collapse to zero.
    pub fn throttle_sleep(&self) -> Duration {
        Duration::try_from_secs_f64(self.throttle_sleep_seconds).unwrap_or(Duration::ZERO)
    }
}

/// `[jobs]`: settings for the built-in jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub submit_url: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            submit_url: "http://127.0.0.1:3000/jobs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub krypton: KryptonConfig,
    pub scheduler: GateConfig,
    pub jobs: JobsConfig,
}

impl OrchestratorConfig {
    /// Resolve the config path: explicit argument, then env var, then the default file name.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(format!("file: {}", path.display())),
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: OrchestratorConfig = toml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid TOML: {}", e.message()),
                ErrorContext::new().with_source("config_loader"),
            )
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        check_seconds(
            "scheduler.throttle_sleep_seconds",
            self.scheduler.throttle_sleep_seconds,
        )?;
        if let Some(t) = self.krypton.binary_timeout_seconds {
            check_seconds("krypton.binary_timeout_seconds", t)?;
        }
        check_url("krypton.http_url", &self.krypton.http_url)?;
        check_url("jobs.submit_url", &self.jobs.submit_url)?;
        Ok(())
    }
}

/// Accepts exactly the values `Duration::try_from_secs_f64` accepts.
fn check_seconds(field: &str, value: f64) -> Result<()> {
    if Duration::try_from_secs_f64(value).is_ok() {
        return Ok(());
    }
    Err(Error::configuration_with_context(
        format!("expected a non-negative, representable number of seconds, got {}", value),
        ErrorContext::new()
            .with_field_path(field)
            .with_source("config_loader"),
    ))
}

fn check_url(field: &str, value: &str) -> Result<()> {
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        Ok(u) => Err(Error::configuration_with_context(
            format!("unsupported URL scheme '{}'", u.scheme()),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("config_loader"),
        )),
        Err(e) => Err(Error::configuration_with_context(
            format!("invalid URL '{}': {}", value, e),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("config_loader"),
        )),
    }
}
