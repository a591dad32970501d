//! Transports that reach the Krypton health producer.
//!
//! Transports move bytes; they never interpret the snapshot layout. That is
//! [`crate::health::normalize`]'s job.

pub mod binary;
pub mod http;

pub use binary::BinaryTransport;
pub use http::HttpTransport;

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to spawn '{}': {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' exited with {status}{}", .path.display(), format_stderr(.stderr))]
    ExitStatus {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{}' did not finish within {timeout:?}", .path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}
