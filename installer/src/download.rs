//! Blocking HTTP retrieval for catalog pages and release assets.
//!
//! All network access goes through the [`HttpClient`] trait so the catalog
//! and the installer can be driven by mocks in tests. Each call is made
//! exactly once; there is no retry.

use std::io::Read;
use std::time::Duration;

/// Upper bound on a single response body.
const MAX_BODY_SIZE: u64 = 512 * 1024 * 1024;

/// A GET request with an optional `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The URL to fetch.
    pub url: String,
    /// Value of the `Authorization` header, if any.
    pub authorization: Option<String>,
    /// Whether the URL is a GitHub REST API endpoint rather than a file.
    pub api: bool,
}

impl HttpRequest {
    /// An unauthenticated request for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: None,
            api: false,
        }
    }

    /// Mark the request as a REST API call so it negotiates the JSON media
    /// type and API version.
    #[must_use]
    pub const fn for_api(mut self) -> Self {
        self.api = true;
        self
    }

    /// Attach a bearer token, if one is given.
    #[must_use]
    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.authorization = token.map(|token| format!("Bearer {token}"));
        self
    }
}

/// Performs a single GET and returns the whole body.
///
/// # Examples
///
/// ```
/// use tvm_installer::download::{HttpRequest, UreqClient};
///
/// let client = UreqClient::new(None);
/// let request = HttpRequest::new("https://example.test/").with_bearer(Some("token"));
/// assert_eq!(request.authorization.as_deref(), Some("Bearer token"));
/// // Use client.get(&request) in production
/// # let _ = client;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient {
    /// Fetch the request URL and return the body.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NotFound`] for HTTP 404, and
    /// [`DownloadError::Http`] for any other non-success status or
    /// transport failure, and [`DownloadError::TooLarge`] when the body
    /// exceeds the client's ceiling.
    fn get(&self, request: &HttpRequest) -> Result<Vec<u8>, DownloadError>;
}

/// Errors arising from HTTP retrieval.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The request failed or returned a non-success status.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The response body is larger than the client accepts.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// The URL that was requested.
        url: String,
        /// The ceiling that was exceeded.
        limit: u64,
    },

    /// Reading the response body failed.
    #[error("I/O error reading download: {0}")]
    Io(#[from] std::io::Error),
}

/// [`HttpClient`] backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Build a client whose requests fail after `timeout`, or never time
    /// out when `None`.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl HttpClient for UreqClient {
    fn get(&self, request: &HttpRequest) -> Result<Vec<u8>, DownloadError> {
        let url = request.url.as_str();
        log::debug!("GET {url}");
        let mut call = self.agent.get(url);
        if let Some(value) = &request.authorization {
            call = call.header("Authorization", value.as_str());
        }
        if request.api {
            call = call
                .header("Accept", "application/vnd.github+json")
                .header("X-GitHub-Api-Version", "2022-11-28");
        }
        let response = call.call().map_err(|e| map_ureq_error(url, &e))?;

        // The body is dropped on every path out of this block.
        let body = read_capped(response.into_body().as_reader(), url, MAX_BODY_SIZE)?;
        log::trace!("received {} bytes from {url}", body.len());
        Ok(body)
    }
}

/// Read the whole of `reader`, failing once more than `limit` bytes arrive.
fn read_capped(reader: impl Read, url: &str, limit: u64) -> Result<Vec<u8>, DownloadError> {
    let mut body = Vec::new();
    let read = reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if u64::try_from(read).is_ok_and(|read| read <= limit) {
        Ok(body)
    } else {
        Err(DownloadError::TooLarge {
            url: url.to_owned(),
            limit,
        })
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
