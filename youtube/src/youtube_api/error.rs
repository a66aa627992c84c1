//! Errors reported by the YouTube API itself (as opposed to transport failures).

use http::{Method, StatusCode};
use std::fmt;

/// A YouTube API request that reached the server but came back with a non-success status.
///
/// The raw response body is kept as-is since YouTube puts the useful diagnostics
/// (`error.errors[].reason`, `error.message`) there.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// The HTTP method of the failed request.
    pub method: Method,
    /// The endpoint that was called, without query parameters.
    pub url: String,
    /// The status code the server responded with.
    pub status: StatusCode,
    /// The unparsed response body.
    pub body: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "YouTube API {} request to {} failed with status {}: {}",
            self.method, self.url, self.status, self.body
        )
    }
}

impl std::error::Error for ApiError {}
