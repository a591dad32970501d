//! Built-in jobs.
//!
//! - `dummy`: local no-op, useful for exercising the gate end to end.
//! - `submit`: POSTs a submission to the configured job endpoint.

use anyhow::Context;
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::config::JobsConfig;
use crate::gate::JobRegistry;

pub const DUMMY_JOB: &str = "dummy";
pub const SUBMIT_JOB: &str = "submit";

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(5);
const LOG_TARGET: &str = "job";

pub fn dummy_job() -> anyhow::Result<()> {
    info!(target: LOG_TARGET, "dummy_job executed");
    Ok(())
}

/// Send one job submission to `url`. Non-2xx responses are failures.
pub fn submit_job(url: &str) -> anyhow::Result<()> {
    let client = Client::builder()
        .timeout(SUBMIT_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .post(url)
        .json(&json!({
            "job": SUBMIT_JOB,
            "source": env!("CARGO_PKG_NAME"),
        }))
        .send()
        .with_context(|| format!("failed to reach job endpoint {}", url))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("job endpoint {} answered HTTP {}", url, status.as_u16());
    }
    info!(target: LOG_TARGET, url = %url, status = status.as_u16(), "job submitted");
    Ok(())
}

/// Registry holding every built-in job.
pub fn builtin_registry(cfg: &JobsConfig) -> JobRegistry {
    let submit_url = cfg.submit_url.clone();
    JobRegistry::new()
        .with_job(DUMMY_JOB, dummy_job)
        .with_job(SUBMIT_JOB, move || submit_job(&submit_url))
}
