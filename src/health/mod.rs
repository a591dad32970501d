//! Health snapshot model.
//!
//! A [`HealthSnapshot`] is one point-in-time reading from the Krypton producer:
//! entropy statistics plus the admission [`Decision`] derived from them.
//! Snapshots are plain values; every acquisition builds a fresh one.

pub mod normalize;

pub use normalize::{ParseError, ResponseShape};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Three-way admission verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    /// Proceed normally.
    Keep,
    /// Proceed after the configured backoff.
    Throttle,
    /// Refuse the job.
    Kill,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Keep => "Keep",
            Decision::Throttle => "Throttle",
            Decision::Kill => "Kill",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = ParseError;

    /// Exact, case-sensitive match. Anything else is rejected rather than coerced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Keep" => Ok(Decision::Keep),
            "Throttle" => Ok(Decision::Throttle),
            "Kill" => Ok(Decision::Kill),
            other => Err(ParseError::UnknownDecision(other.to_string())),
        }
    }
}

/// A single health reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthSnapshot {
    /// Number of underlying observations.
    pub samples: u64,
    pub mean: f64,
    /// Always >= 0.
    pub variance: f64,
    /// Always >= 0.
    pub jitter: f64,
    pub decision: Decision,
}

impl HealthSnapshot {
    /// Fail-open snapshot substituted whenever the producer cannot be reached or parsed.
    pub const STUB: HealthSnapshot = HealthSnapshot {
        samples: 1024,
        mean: 0.5,
        variance: 0.25,
        jitter: 0.01,
        decision: Decision::Keep,
    };

    pub fn stub() -> Self {
        Self::STUB
    }
}

/// Anything that can hand the gate a snapshot.
///
/// Implementations must be total: failures are absorbed and expressed as a
/// snapshot (normally [`HealthSnapshot::STUB`]), never as an error.
pub trait HealthSource {
    fn acquire(&self) -> HealthSnapshot;
}

impl<F> HealthSource for F
where
    F: Fn() -> HealthSnapshot,
{
    fn acquire(&self) -> HealthSnapshot {
        self()
    }
}
