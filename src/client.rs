//! Krypton health client.
//!
//! [`KryptonClient::acquire`] is total: whatever goes wrong (missing binary,
//! non-zero exit, bad JSON, HTTP error, unknown mode) is logged under the
//! `krypton-client` target and replaced by [`HealthSnapshot::STUB`]. Callers
//! that want the cause use [`KryptonClient::try_acquire`].
//!
//! Each call makes exactly one attempt. Retrying is the caller's business.

use tracing::{debug, warn};

use crate::config::{KryptonConfig, TransportMode};
use crate::health::normalize::{self, ParseError, ResponseShape};
use crate::health::{HealthSnapshot, HealthSource};
use crate::transport::{BinaryTransport, HttpTransport, TransportError};

const LOG_TARGET: &str = "krypton-client";

#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("parse failure: {0}")]
    Parse(#[from] ParseError),

    #[error("unknown transport mode '{0}'")]
    UnknownMode(String),
}

#[derive(Debug, Clone)]
pub struct KryptonClient {
    config: KryptonConfig,
}

impl KryptonClient {
    pub fn new(config: KryptonConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KryptonConfig {
        &self.config
    }

    /// Human-readable description of what this client talks to.
    pub fn endpoint(&self) -> String {
        match &self.config.mode {
            TransportMode::Binary => self.config.binary_path.display().to_string(),
            TransportMode::Http => self.config.http_url.clone(),
            TransportMode::Other(mode) => format!("<mode {}>", mode),
        }
    }

    /// One acquisition attempt, with the failure cause preserved.
    pub fn try_acquire(&self) -> Result<HealthSnapshot, AcquireError> {
        match &self.config.mode {
            TransportMode::Binary => {
                let transport = BinaryTransport::new(&self.config.binary_path)
                    .with_timeout(self.config.binary_timeout());
                let stdout = transport.fetch()?;
                Ok(normalize::from_process_output(stdout)?)
            }
            TransportMode::Http => {
                let transport = HttpTransport::new(&self.config.http_url)?;
                let body = transport.fetch()?;
                let value: serde_json::Value =
                    serde_json::from_str(&body).map_err(ParseError::from)?;
                Ok(normalize::normalize(&value, ResponseShape::Envelope)?)
            }
            TransportMode::Other(mode) => Err(AcquireError::UnknownMode(mode.clone())),
        }
    }

    /// Acquire a snapshot, substituting the stub on any failure.
    pub fn acquire(&self) -> HealthSnapshot {
        match self.try_acquire() {
            Ok(snapshot) => {
                debug!(
                    target: LOG_TARGET,
                    mode = %self.config.mode,
                    endpoint = %self.endpoint(),
                    decision = %snapshot.decision,
                    samples = snapshot.samples,
                    "acquired health snapshot"
                );
                snapshot
            }
            Err(AcquireError::UnknownMode(mode)) => {
                warn!(
                    target: LOG_TARGET,
                    mode = %mode,
                    "Unknown mode '{}', using stub",
                    mode
                );
                HealthSnapshot::STUB
            }
            Err(e) => {
                warn!(
                    target: LOG_TARGET,
                    mode = %self.config.mode,
                    endpoint = %self.endpoint(),
                    error = %e,
                    "Error talking to Krypton, using stub"
                );
                HealthSnapshot::STUB
            }
        }
    }
}

impl HealthSource for KryptonClient {
    fn acquire(&self) -> HealthSnapshot {
        KryptonClient::acquire(self)
    }
}
