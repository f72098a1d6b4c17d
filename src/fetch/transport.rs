//! HTTP transport for index metadata and artifact payloads.
//!
//! Provides a trait-based abstraction over the two kinds of GET request the
//! pipeline performs (a JSON document into memory, a payload into a file),
//! enabling dependency injection for testing. Every request carries the
//! fixed identifying `User-Agent` the package index asks clients to send.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Identifying user agent sent with every outbound request.
///
/// The package index asks for a unique, identifying value with a contact
/// reference.
pub const USER_AGENT: &str = "modfetch/0.1 (+https://github.com/df12/modfetch)";

/// Connection establishment timeout for all requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
/// Overall deadline per request, bounding slow payload reads.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Trait for performing the pipeline's outbound GET requests.
///
/// Abstraction allows tests to mock HTTP behaviour without network access.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Fetch `url` and return the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-2xx status or a network failure.
    fn fetch_text(&self, url: &str) -> Result<String, TransportError>;

    /// Fetch `url` and write the response body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-2xx status, a network failure, or a file
    /// write failure.
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), TransportError>;
}

/// Errors arising from outbound requests.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} @ {url}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The status code the server returned.
        status: u16,
    },

    /// The request could not be completed.
    #[error("request failed for {url}: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error writing the downloaded payload.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based transport using `ureq`.
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        let response = http_agent()
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| TransportError::Network {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        let response = http_agent()
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(TransportError::Io)?;
        Ok(())
    }
}

/// Shared `ureq` agent with timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`TransportError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> TransportError {
    match err {
        ureq::Error::StatusCode(status) => TransportError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => TransportError::Network {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_contact_reference() {
        assert!(USER_AGENT.starts_with("modfetch/"));
        assert!(USER_AGENT.contains("+https://"));
    }

    #[test]
    fn map_ureq_error_maps_status_codes() {
        let err = ureq::Error::StatusCode(503);
        let mapped = map_ureq_error("https://example.test/a.jar", &err);
        match mapped {
            TransportError::Status { url, status } => {
                assert_eq!(url, "https://example.test/a.jar");
                assert_eq!(status, 503);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn map_ureq_error_maps_other_failures_to_network() {
        let err = ureq::Error::Io(std::io::Error::other("connection reset"));
        let mapped = map_ureq_error("https://example.test/a.jar", &err);
        assert!(matches!(mapped, TransportError::Network { .. }));
    }
}
