//! Job registry.

use std::collections::HashMap;
use std::fmt;

/// A zero-argument job. Its error, if any, is returned to the gate's caller untouched.
pub type Job = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Named jobs the gate can run by id. The gate only reads from it.
#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` under `id`, replacing any previous job with that id.
    pub fn register<F>(&mut self, id: impl Into<String>, job: F) -> Option<Job>
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.jobs.insert(id.into(), Box::new(job))
    }

    pub fn with_job<F>(mut self, id: impl Into<String>, job: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(id, job);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("jobs", &self.ids())
            .finish()
    }
}
