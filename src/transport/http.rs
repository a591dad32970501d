use std::time::Duration;

use reqwest::blocking::Client;

use super::TransportError;

/// Fixed budget for one health GET (connect + read).
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

/// Blocking GET against the health endpoint.
///
/// One transport per acquisition: connections are never shared between
/// acquisitions.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(url, HEALTH_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the endpoint and return the raw body.
    ///
    /// Anything outside 2xx is an error; the body is not read in that case.
    pub fn fetch(&self) -> Result<String, TransportError> {
        let response = self
            .client
            .get(&self.url)
            .header("accept", "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        Ok(response.text()?)
    }
}
