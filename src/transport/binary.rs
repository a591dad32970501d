use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::TransportError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the local health executable (no arguments) and captures its stdout.
#[derive(Debug, Clone)]
pub struct BinaryTransport {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl BinaryTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: None,
        }
    }

    /// Kill the producer if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the executable once and return the raw bytes it wrote to stdout.
    ///
    /// A non-zero exit is an error even if stdout looks usable.
    pub fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TransportError::Spawn {
                path: self.path.clone(),
                source: e,
            })?;

        // Drain both pipes on their own threads so a chatty producer cannot
        // fill a pipe buffer and stall before exiting.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => self.wait_with_deadline(&mut child, limit)?,
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(TransportError::ExitStatus {
                path: self.path.clone(),
                status,
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }
        Ok(stdout)
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
        limit: Duration,
    ) -> Result<ExitStatus, TransportError> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                return Err(TransportError::Timeout {
                    path: self.path.clone(),
                    timeout: limit,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}
