//! Decision gate.
//!
//! Turns a health [`Decision`] into an [`Action`] on a job:
//!
//! | Decision   | Action      | Job                                  |
//! |------------|-------------|--------------------------------------|
//! | `Keep`     | `Run`       | invoked immediately                  |
//! | `Throttle` | `Throttled` | invoked after `throttle_sleep`       |
//! | `Kill`     | `Skipped`   | never invoked                        |
//!
//! The job is opaque: its error is returned as-is, and a panic unwinds
//! through the gate. Each call acquires its own snapshot; nothing is cached.

pub mod registry;

pub use registry::{Job, JobRegistry};

use serde::Serialize;
use std::fmt;
use std::thread;
use tracing::debug;

use crate::config::GateConfig;
use crate::health::{Decision, HealthSnapshot, HealthSource};
use crate::{Error, Result};

const LOG_TARGET: &str = "gate";

/// What the gate did with the job on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Run,
    Throttled,
    Skipped,
}

impl Action {
    pub fn for_decision(decision: Decision) -> Self {
        match decision {
            Decision::Keep => Action::Run,
            Decision::Throttle => Action::Throttled,
            Decision::Kill => Action::Skipped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Run => "run",
            Action::Throttled => "throttled",
            Action::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The snapshot a decision was based on, and what was done with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateOutcome {
    #[serde(flatten)]
    pub snapshot: HealthSnapshot,
    pub action: Action,
}

pub struct Gate<S> {
    source: S,
}

impl<S: HealthSource> Gate<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Acquire one snapshot and run, delay, or skip `job` accordingly.
    pub fn run_once<F, E>(&self, job: F, cfg: &GateConfig) -> std::result::Result<GateOutcome, E>
    where
        F: FnOnce() -> std::result::Result<(), E>,
    {
        let snapshot = self.source.acquire();
        let action = Action::for_decision(snapshot.decision);

        match action {
            Action::Skipped => {
                debug!(target: LOG_TARGET, decision = %snapshot.decision, "skipping job");
            }
            Action::Throttled => {
                let delay = cfg.throttle_sleep();
                debug!(target: LOG_TARGET, delay_ms = delay.as_millis() as u64, "throttling job");
                thread::sleep(delay);
                job()?;
            }
            Action::Run => {
                debug!(target: LOG_TARGET, "running job");
                job()?;
            }
        }

        Ok(GateOutcome { snapshot, action })
    }

    /// Look `id` up in `registry`, then gate it.
    ///
    /// An unknown id fails before any health acquisition takes place.
    pub fn run_by_name(
        &self,
        id: &str,
        registry: &JobRegistry,
        cfg: &GateConfig,
    ) -> Result<GateOutcome> {
        let job = registry.get(id).ok_or_else(|| Error::job_not_found(id))?;
        self.run_once(|| job(), cfg).map_err(Error::Job)
    }
}
