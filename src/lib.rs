//! # krypton-boundary-orchestrator
//!
//! Gates job execution behind the Krypton entropy health signal.
//!
//! ## Overview
//!
//! A Krypton producer classifies current entropy/noise conditions into one of
//! three decisions. This crate acquires that signal and acts on it:
//!
//! - **Health client**: [`KryptonClient`] reaches the producer through a local
//!   executable or an HTTP endpoint, accepts flat and enveloped responses, and
//!   fails open to [`HealthSnapshot::STUB`] (`Keep`) when anything goes wrong.
//! - **Gate**: [`Gate`] maps the decision to an [`Action`]: run the job, run it
//!   after a backoff, or skip it.
//!
//! The producer itself is out of scope; this crate only consumes it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use krypton_boundary_orchestrator::{jobs, Gate, KryptonClient, OrchestratorConfig};
//!
//! fn main() -> krypton_boundary_orchestrator::Result<()> {
//!     let cfg = OrchestratorConfig::load(&OrchestratorConfig::resolve_path(None))?;
//!     let registry = jobs::builtin_registry(&cfg.jobs);
//!     let gate = Gate::new(KryptonClient::new(cfg.krypton.clone()));
//!
//!     let outcome = gate.run_by_name("dummy", &registry, &cfg.scheduler)?;
//!     println!("{} -> {}", outcome.snapshot.decision, outcome.action);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`health`] | Snapshot model and shape-tolerant parsing |
//! | [`transport`] | Process and HTTP transports |
//! | [`client`] | Fail-open health acquisition |
//! | [`gate`] | Decision gate and job registry |
//! | [`jobs`] | Built-in jobs |
//! | [`config`] | TOML configuration |
//! | [`telemetry`] | Loop driver and outcome aggregation |

pub mod client;
pub mod config;
pub mod gate;
pub mod health;
pub mod jobs;
pub mod telemetry;
pub mod transport;

pub use client::{AcquireError, KryptonClient};
pub use config::{GateConfig, JobsConfig, KryptonConfig, OrchestratorConfig, TransportMode};
pub use gate::{Action, Gate, GateOutcome, Job, JobRegistry};
pub use health::{Decision, HealthSnapshot, HealthSource};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

pub mod error;
pub use error::{Error, ErrorContext};

/// Pretty-print `value` as JSON with object keys in sorted order.
///
/// Used for every document the CLI writes to stdout.
pub fn render_json<T: serde::Serialize>(value: &T) -> Result<String> {
    // Value's map is ordered, so the round trip sorts keys.
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
