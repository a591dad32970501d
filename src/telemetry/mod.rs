//! Loop driver and outcome aggregation.
//!
//! [`drive`] runs a registered job through the gate repeatedly and folds each
//! [`GateOutcome`] into a [`LoopSummary`]. Every iteration acquires a fresh
//! snapshot; the summary only keeps running aggregates, never the snapshots.

use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::info;

use crate::config::GateConfig;
use crate::gate::{Action, Gate, GateOutcome, JobRegistry};
use crate::health::{Decision, HealthSource};
use crate::Result;

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub iterations: u64,
    /// Pause between iterations; not applied after the last one.
    pub interval: Duration,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub run: u64,
    pub throttled: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionCounts {
    pub keep: u64,
    pub throttle: u64,
    pub kill: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopSummary {
    pub iterations: u64,
    pub actions: ActionCounts,
    pub decisions: DecisionCounts,
    /// Average of the per-iteration `mean` values.
    pub mean_of_means: f64,
    pub max_jitter: f64,
    pub min_samples: Option<u64>,
}

impl LoopSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &GateOutcome) {
        let snapshot = &outcome.snapshot;
        self.iterations += 1;

        match outcome.action {
            Action::Run => self.actions.run += 1,
            Action::Throttled => self.actions.throttled += 1,
            Action::Skipped => self.actions.skipped += 1,
        }
        match snapshot.decision {
            Decision::Keep => self.decisions.keep += 1,
            Decision::Throttle => self.decisions.throttle += 1,
            Decision::Kill => self.decisions.kill += 1,
        }

        self.mean_of_means += (snapshot.mean - self.mean_of_means) / self.iterations as f64;
        self.max_jitter = self.max_jitter.max(snapshot.jitter);
        self.min_samples = Some(match self.min_samples {
            Some(m) => m.min(snapshot.samples),
            None => snapshot.samples,
        });
    }
}

/// Run `job_id` through `gate` `opts.iterations` times.
///
/// Stops at the first error (unknown job or job failure) and returns it.
pub fn drive<S: HealthSource>(
    gate: &Gate<S>,
    job_id: &str,
    registry: &JobRegistry,
    cfg: &GateConfig,
    opts: &LoopOptions,
) -> Result<LoopSummary> {
    let mut summary = LoopSummary::new();
    for i in 0..opts.iterations {
        if i > 0 && !opts.interval.is_zero() {
            thread::sleep(opts.interval);
        }
        let outcome = gate.run_by_name(job_id, registry, cfg)?;
        info!(
            iteration = i + 1,
            job = job_id,
            decision = %outcome.snapshot.decision,
            action = %outcome.action,
            "loop iteration"
        );
        summary.record(&outcome);
    }
    Ok(summary)
}
