//! HTTP fetcher with retry, rate limiting, and cancellation
//!
//! All upstream traffic goes through [`DcFetcher`]. It applies a baseline
//! requests-per-second cap, follows up to five redirects (DCInside bounces
//! between board variants), retries transient failures with exponential
//! backoff, and decodes bodies as UTF-8 with an EUC-KR fallback. Retry state
//! is local to each call.

use std::time::Duration;

use encoding_rs::{EUC_KR, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{redirect, Client, RequestBuilder, Response};
use std::num::NonZeroU32;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::Config;
use crate::crawler::headers::{build_comment_headers, build_page_headers, random_user_agent};
use crate::error::FetchError;

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 5;

/// Base backoff unit; retry k sleeps `2^k` of these
const BASE_DELAY_MS: u64 = 1000;

pub struct DcFetcher {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    max_retries: u32,

    /// Referer sent on comment API posts: the run URL, or the site root
    run_referer: String,

    /// Base URL override for mock-server tests
    base_url: Option<String>,

    cancel: CancellationToken,
}

impl DcFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(config.crawler.rate_limit)
            .unwrap_or_else(|| NonZeroU32::new(1).expect("1 is non-zero"));
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.crawler.max_retries,
            run_referer: config.site.host.clone(),
            base_url: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Point all requests at a mock server
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Referer used for comment API posts
    pub fn with_run_referer(mut self, referer: impl Into<String>) -> Self {
        self.run_referer = referer.into();
        self
    }

    /// Abort in-flight and queued requests when the token fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch a page as text
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        let full_url = self.resolve(url);
        let referer = origin_of(&full_url).unwrap_or_else(|| self.run_referer.clone());

        self.send_with_retry(|| {
            self.client
                .get(&full_url)
                .headers(build_page_headers(random_user_agent(), &referer))
        })
        .await
    }

    /// Post a form-urlencoded body and return the response text
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let full_url = self.resolve(url);

        self.send_with_retry(|| {
            self.client
                .post(&full_url)
                .headers(build_comment_headers(random_user_agent(), &self.run_referer))
                .form(form)
        })
        .await
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if url.starts_with('/') => format!("{base}{url}"),
            _ => url.to_string(),
        }
    }

    /// Send with exponential backoff: retry k waits `2^k * 1000 ms`, at most
    /// `max_retries` retries after the first attempt. 404 never retries.
    async fn send_with_retry(
        &self,
        make_request: impl Fn() -> RequestBuilder,
    ) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying request");
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            self.rate_limiter.until_ready().await;

            let response = tokio::select! {
                _ = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                result = make_request().send() => result,
            };

            match response {
                Ok(response) => {
                    let status = response.status();
                    // A 3xx that survived the redirect policy is final
                    if status.is_success() || status.is_redirection() {
                        return self.decode_response(response).await;
                    }

                    let error = classify_status(status.as_u16());
                    if !error.is_recoverable() {
                        return Err(error);
                    }
                    tracing::warn!(status = status.as_u16(), "retryable upstream status");
                    last_error = Some(error);
                }
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        FetchError::Timeout
                    } else {
                        FetchError::Http(e)
                    });
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::MaxRetriesExceeded))
    }

    async fn decode_response(&self, response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let bytes = response.bytes().await?;
        decode_bytes(&bytes, &content_type)
    }
}

/// Map a non-success status onto the error taxonomy
fn classify_status(status: u16) -> FetchError {
    match status {
        404 => FetchError::NotFound,
        429 => FetchError::RateLimited,
        _ => FetchError::Server(status),
    }
}

/// Decode a response body, honoring the declared charset and falling back
/// from UTF-8 to EUC-KR
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
    if content_type.contains("charset=euc-kr") {
        return decode_with(EUC_KR, bytes);
    }
    if content_type.contains("charset=utf-8") {
        return decode_with(UTF_8, bytes);
    }

    if let Ok(text) = decode_with(UTF_8, bytes) {
        if !text.starts_with('\u{FFFD}') {
            return Ok(text);
        }
    }
    decode_with(EUC_KR, bytes)
}

/// Origin (`scheme://host[:port]`) of an absolute URL
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

fn decode_with(encoding: &'static encoding_rs::Encoding, bytes: &[u8]) -> Result<String, FetchError> {
    let (cow, _encoding, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(FetchError::Decode(format!(
            "{} decoding errors",
            encoding.name()
        )));
    }
    Ok(cow.into_owned())
}
