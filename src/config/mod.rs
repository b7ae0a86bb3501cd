//! Configuration management for the pado crawler
//!
//! Loads settings from environment variables or a TOML file, and resolves a
//! crawler code plus run options into a concrete [`CrawlMode`].

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::CrawlerError;
use crate::models::{CrawlMode, CrawlOptions};

/// Default site root when `DC_HOST` is unset
pub const DEFAULT_HOST: &str = "https://gall.dcinside.com";

/// Hours subtracted from the expiration window on top of the period itself
const SLEEP_MARGIN_HOURS: i64 = 1;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

/// Crawler-specific tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Per-attempt request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Baseline rate limit (requests per second)
    pub rate_limit: u32,

    /// Politeness base delay between listing page fetches (ms)
    pub listing_delay_ms: u64,

    /// Politeness base delay around post detail fetches (ms)
    pub detail_delay_ms: u64,

    /// Politeness base delay between comment pages (ms)
    pub comment_delay_ms: u64,

    /// Liveness log interval in seconds
    pub heartbeat_secs: u64,

    /// Run the rehydrate phase over recently stored posts
    pub rehydrate: bool,
}

/// Site endpoints and mode selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root, `DC_HOST`
    pub host: String,

    /// Crawler code selecting keyword mode, `DC_KEYWORD_CRAWLER`
    pub keyword_crawler_code: Option<String>,

    /// Crawler code selecting gallog mode, `DC_GALLOG_CRAWLER`
    pub gallog_crawler_code: Option<String>,

    /// Rehydrate window in days, `EXPIRATION_PERIOD`; 0 disables it
    pub expiration_period_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("DC_HOST") {
            config.site.host = host;
        }
        config.site.keyword_crawler_code = std::env::var("DC_KEYWORD_CRAWLER").ok();
        config.site.gallog_crawler_code = std::env::var("DC_GALLOG_CRAWLER").ok();
        config.site.expiration_period_days = std::env::var("EXPIRATION_PERIOD")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        if let Ok(v) = std::env::var("PADO_REQUEST_TIMEOUT") {
            config.crawler.request_timeout_secs = v.parse().context("PADO_REQUEST_TIMEOUT")?;
        }
        if let Ok(v) = std::env::var("PADO_MAX_RETRIES") {
            config.crawler.max_retries = v.parse().context("PADO_MAX_RETRIES")?;
        }
        if let Ok(v) = std::env::var("PADO_RATE_LIMIT") {
            config.crawler.rate_limit = v.parse().context("PADO_RATE_LIMIT")?;
        }
        if let Ok(v) = std::env::var("PADO_REHYDRATE") {
            config.crawler.rehydrate = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("PADO_LOG_LEVEL") {
            config.logging.level = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.crawler.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }
        if self.crawler.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }
        if self.site.host.is_empty() {
            anyhow::bail!("site host must not be empty");
        }
        if self.site.expiration_period_days < 0 {
            anyhow::bail!("expiration_period_days must not be negative");
        }
        Ok(())
    }

    /// Resolve the crawler code and options into a concrete mode
    ///
    /// Unknown codes fall back to treating the input URL (or a plain gallery
    /// listing built from `target`) as a raw listing; with neither input the
    /// run cannot start.
    pub fn resolve_mode(&self, options: &CrawlOptions) -> Result<CrawlMode, CrawlerError> {
        if self
            .site
            .keyword_crawler_code
            .as_deref()
            .is_some_and(|code| code == options.crawler_code)
        {
            let target = options
                .target
                .clone()
                .ok_or_else(|| CrawlerError::config("keyword mode requires --target"))?;
            let keyword = options
                .keyword
                .clone()
                .ok_or_else(|| CrawlerError::config("keyword mode requires --keyword"))?;
            return Ok(CrawlMode::Keyword { target, keyword });
        }

        if self
            .site
            .gallog_crawler_code
            .as_deref()
            .is_some_and(|code| code == options.crawler_code)
        {
            let url = options
                .url
                .clone()
                .ok_or_else(|| CrawlerError::config("gallog mode requires --url"))?;
            return Ok(CrawlMode::Gallog { url });
        }

        if let Some(url) = &options.url {
            return Ok(CrawlMode::Raw { url: url.clone() });
        }
        if let Some(target) = &options.target {
            return Ok(CrawlMode::Raw {
                url: format!("{}/board/lists/?id={target}", self.site.host),
            });
        }

        Err(CrawlerError::config(
            "no mode matched the crawler code and neither --url nor --target was given",
        ))
    }

    /// First listing URL for a resolved mode
    pub fn start_url(&self, mode: &CrawlMode) -> String {
        match mode {
            CrawlMode::Keyword { target, keyword } => {
                let encoded: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
                format!(
                    "{}/board/lists/?id={target}&s_type=search_subject_memo&s_keyword={encoded}",
                    self.site.host
                )
            }
            CrawlMode::Gallog { url } => format!("{}/posting", url.trim_end_matches('/')),
            CrawlMode::Raw { url } => url.clone(),
        }
    }

    /// Lower bound of the rehydrate window, if a period is configured
    ///
    /// `now − period − sleep margin`, all in KST.
    pub fn expiration_date(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Option<DateTime<FixedOffset>> {
        if self.site.expiration_period_days <= 0 {
            return None;
        }
        Some(
            now - chrono::Duration::days(self.site.expiration_period_days)
                - chrono::Duration::hours(SLEEP_MARGIN_HOURS),
        )
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.crawler.heartbeat_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig {
                request_timeout_secs: 10,
                max_retries: 3,
                rate_limit: 2,
                listing_delay_ms: 1000,
                detail_delay_ms: 1000,
                comment_delay_ms: 2000,
                heartbeat_secs: 15,
                rehydrate: false,
            },
            site: SiteConfig {
                host: String::from(DEFAULT_HOST),
                keyword_crawler_code: None,
                gallog_crawler_code: None,
                expiration_period_days: 0,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::date::kst;
    use chrono::TimeZone;

    fn options(cid: &str) -> CrawlOptions {
        CrawlOptions {
            scenario_id: "s1".into(),
            crawler_code: cid.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_rate_limit() {
        let mut config = Config::default();
        config.crawler.rate_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_keyword_mode_resolution() {
        let mut config = Config::default();
        config.site.keyword_crawler_code = Some("dc-kw".into());

        let mut opts = options("dc-kw");
        opts.target = Some("programming".into());
        opts.keyword = Some("러스트 공부".into());

        let mode = config.resolve_mode(&opts).unwrap();
        assert!(matches!(mode, CrawlMode::Keyword { .. }));

        let url = config.start_url(&mode);
        assert!(url.starts_with("https://gall.dcinside.com/board/lists/?id=programming"));
        assert!(url.contains("s_type=search_subject_memo"));
        // keyword is url-encoded, spaces included
        assert!(url.contains("s_keyword=%EB%9F%AC%EC%8A%A4%ED%8A%B8+%EA%B3%B5%EB%B6%80"));
    }

    #[test]
    fn test_keyword_mode_requires_inputs() {
        let mut config = Config::default();
        config.site.keyword_crawler_code = Some("dc-kw".into());

        let mut opts = options("dc-kw");
        opts.target = Some("programming".into());
        assert!(config.resolve_mode(&opts).is_err());

        opts.target = None;
        opts.keyword = Some("rust".into());
        assert!(config.resolve_mode(&opts).is_err());
    }

    #[test]
    fn test_gallog_mode_resolution() {
        let mut config = Config::default();
        config.site.gallog_crawler_code = Some("dc-gallog".into());

        let mut opts = options("dc-gallog");
        opts.url = Some("https://gallog.dcinside.com/someone/".into());

        let mode = config.resolve_mode(&opts).unwrap();
        assert_eq!(
            config.start_url(&mode),
            "https://gallog.dcinside.com/someone/posting"
        );

        opts.url = None;
        assert!(config.resolve_mode(&opts).is_err());
    }

    #[test]
    fn test_raw_mode_fallback() {
        let config = Config::default();

        let mut opts = options("unknown-code");
        opts.url = Some("https://gall.dcinside.com/board/lists/?id=cat".into());
        let mode = config.resolve_mode(&opts).unwrap();
        assert_eq!(
            config.start_url(&mode),
            "https://gall.dcinside.com/board/lists/?id=cat"
        );

        opts.url = None;
        opts.target = Some("cat".into());
        let mode = config.resolve_mode(&opts).unwrap();
        assert_eq!(
            config.start_url(&mode),
            "https://gall.dcinside.com/board/lists/?id=cat"
        );

        opts.target = None;
        assert!(config.resolve_mode(&opts).is_err());
    }

    #[test]
    fn test_expiration_date() {
        let mut config = Config::default();
        let now = kst().with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap();

        assert!(config.expiration_date(now).is_none());

        config.site.expiration_period_days = 3;
        let expiration = config.expiration_date(now).unwrap();
        assert_eq!(
            expiration,
            kst().with_ymd_and_hms(2025, 9, 7, 11, 0, 0).unwrap()
        );
    }
}
