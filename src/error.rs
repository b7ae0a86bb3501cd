//! Error types for the pado crawler
//!
//! Three layers: [`FetchError`] for HTTP transport, [`ParseError`] for
//! HTML/JSON extraction, and [`CrawlerError`] wrapping both plus the
//! configuration and backend failure modes the engine surfaces.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit response (429)
    #[error("Rate limited by upstream")]
    RateLimited,

    /// Resource does not exist (404); never retried
    #[error("Not found")]
    NotFound,

    /// Other server error with status code
    #[error("Server error: {0}")]
    Server(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// All retry attempts exhausted
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Response body could not be decoded to text
    #[error("Decoding error: {0}")]
    Decode(String),

    /// URL rejected before sending
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request abandoned by the cancellation token
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether the fetcher's retry loop may try again
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            FetchError::NotFound | FetchError::InvalidUrl(_) | FetchError::Cancelled
        )
    }
}

/// Errors that can occur during parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    /// URL cannot be decoded into a platform ID
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// View page has no post form; the post was deleted
    #[error("Post not found")]
    PostNotFound,

    /// Required element or attribute missing from the page
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Timestamp did not match any accepted format
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Payload shape not recognized
    #[error("Unknown or unsupported format")]
    UnknownFormat,
}

impl ParseError {
    pub fn is_recoverable(&self) -> bool {
        // A deleted post is an expected condition; everything else is a
        // hard parse failure for the item at hand.
        matches!(self, ParseError::PostNotFound)
    }
}

/// Errors surfaced by the crawl engine
#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Missing or inconsistent inputs for the selected mode
    #[error("Config error: {0}")]
    Config(String),

    /// Failure reported by the storage backend
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl CrawlerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            CrawlerError::Fetch(e) => e.is_recoverable(),
            CrawlerError::Parse(e) => e.is_recoverable(),
            CrawlerError::Config(_) | CrawlerError::Backend(_) => false,
        }
    }
}

/// Result alias for engine-level operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_recoverability() {
        assert!(FetchError::RateLimited.is_recoverable());
        assert!(FetchError::Timeout.is_recoverable());
        assert!(FetchError::Server(500).is_recoverable());
        assert!(!FetchError::NotFound.is_recoverable());
        assert!(!FetchError::Cancelled.is_recoverable());
        assert!(!FetchError::InvalidUrl("x".into()).is_recoverable());
    }

    #[test]
    fn test_parse_error_recoverability() {
        assert!(ParseError::PostNotFound.is_recoverable());
        assert!(!ParseError::MissingField("title").is_recoverable());
    }

    #[test]
    fn test_crawler_error_conversion() {
        let err: CrawlerError = FetchError::RateLimited.into();
        assert!(matches!(err, CrawlerError::Fetch(_)));
        assert!(err.is_recoverable());

        let err = CrawlerError::config("keyword missing");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("keyword missing"));
    }
}
