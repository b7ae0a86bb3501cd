//! DCInside crawl engine
//!
//! The engine runs one scenario end to end: an optional rehydrate pass over
//! recently stored posts, the listing walk that queues new posts up to the
//! incremental frontier, and the detail pass that fetches each queued post
//! and pages through its comments. One engine instance owns one run; nothing
//! is shared between instances except the repository.

pub mod comment;
pub mod fetcher;
pub mod headers;
pub mod list;
pub mod url;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::crawler::comment::CommentCollector;
use crate::crawler::fetcher::DcFetcher;
use crate::crawler::list::ListingWalker;
use crate::error::{CrawlerError, FetchError};
use crate::models::{CrawlMode, CrawlOptions, CrawlReport, PostKey};
use crate::parser::date::now_kst;
use crate::parser::{parse_post_detail, ListingMode, PostDetail};
use crate::storage::{PostInput, PostRepository};
use crate::utils::polite_sleep;

/// Crawl engine for one scenario run
pub struct DcCrawler {
    config: Config,
    options: CrawlOptions,
    mode: CrawlMode,
    listing_mode: ListingMode,
    start_url: String,
    /// Origin the run stays on; also the resolution base for relative hrefs
    base_url: String,
    expiration_date: Option<DateTime<FixedOffset>>,
    fetcher: DcFetcher,
    repository: Arc<dyn PostRepository>,
    cancel: CancellationToken,
}

impl DcCrawler {
    /// Resolve the mode and build an engine
    ///
    /// # Errors
    ///
    /// `CrawlerError::Config` when the selected mode is missing its required
    /// inputs, `CrawlerError::Fetch` when the HTTP client cannot be built.
    pub fn new(
        config: Config,
        options: CrawlOptions,
        repository: Arc<dyn PostRepository>,
    ) -> Result<Self, CrawlerError> {
        let mode = config.resolve_mode(&options)?;
        let start_url = config.start_url(&mode);
        let base_url = origin_or(&start_url, &config.site.host);
        let listing_mode = match mode {
            CrawlMode::Gallog { .. } => ListingMode::Gallog,
            _ => ListingMode::Keyword,
        };
        let expiration_date = config.expiration_date(now_kst());

        let cancel = CancellationToken::new();
        let fetcher = DcFetcher::new(&config)?
            .with_run_referer(start_url.clone())
            .with_cancellation(cancel.clone());

        tracing::info!(
            scenario = %options.scenario_id,
            mode = %mode,
            start_url = %start_url,
            "crawler constructed"
        );

        Ok(Self {
            config,
            options,
            mode,
            listing_mode,
            start_url,
            base_url,
            expiration_date,
            fetcher,
            repository,
            cancel,
        })
    }

    /// Replace the cancellation token, rewiring the fetcher
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.fetcher = self.fetcher.with_cancellation(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Token that aborts this run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn mode(&self) -> &CrawlMode {
        &self.mode
    }

    /// Run the scenario: optional rehydrate, listing walk, detail collection
    pub async fn start_crawling(&self) -> Result<CrawlReport, CrawlerError> {
        let heartbeat = self.spawn_heartbeat();
        let result = self.run().await;
        heartbeat.abort();
        result
    }

    async fn run(&self) -> Result<CrawlReport, CrawlerError> {
        let mut report = CrawlReport::default();

        if self.config.crawler.rehydrate {
            if let Some(expiration) = self.expiration_date {
                self.rehydrate(expiration, &mut report).await?;
            }
        }

        let walker = ListingWalker {
            fetcher: &self.fetcher,
            repository: &*self.repository,
            scenario_id: &self.options.scenario_id,
            mode: self.listing_mode,
            base_url: &self.base_url,
            date_from: self.options.date_from,
            listing_delay_ms: self.config.crawler.listing_delay_ms,
            cancel: &self.cancel,
        };
        let queued = walker.walk(&self.start_url).await?;
        report.queued_posts = queued.len();

        let mut keys: Vec<PostKey> = queued.into_iter().collect();
        keys.sort();

        tracing::info!(queued = keys.len(), "starting detail collection");

        let endpoint = format!("{}/board/comment/", self.base_url);
        let collector = CommentCollector {
            fetcher: &self.fetcher,
            repository: &*self.repository,
            endpoint: &endpoint,
            comment_delay_ms: self.config.crawler.comment_delay_ms,
            cancel: &self.cancel,
        };

        let total = keys.len();
        for (index, key) in keys.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            polite_sleep(self.config.crawler.detail_delay_ms).await;

            match self.collect_post(&collector, key).await? {
                Some(comments) => {
                    report.saved_posts += 1;
                    report.saved_comments += comments;
                }
                None => report.skipped_posts += 1,
            }

            tracing::info!(
                platform_id = %key,
                progress = %format!("{}/{} ({:.0}%)", index + 1, total, (index + 1) as f64 * 100.0 / total as f64),
                "post processed"
            );
        }

        if self.cancel.is_cancelled() {
            report.cancelled = true;
        }

        tracing::info!(
            saved_posts = report.saved_posts,
            skipped_posts = report.skipped_posts,
            saved_comments = report.saved_comments,
            cancelled = report.cancelled,
            "crawl finished"
        );
        Ok(report)
    }

    /// Fetch, parse, and persist one queued post
    ///
    /// Returns the number of comments saved, or `None` when the post was
    /// skipped (deleted upstream or unparsable). Rate-limit exhaustion and
    /// backend failures propagate and end the run.
    async fn collect_post(
        &self,
        collector: &CommentCollector<'_>,
        key: &PostKey,
    ) -> Result<Option<usize>, CrawlerError> {
        let url = self.view_url(key);

        let html = match self.fetcher.get(&url).await {
            Ok(html) => html,
            Err(FetchError::NotFound) => {
                tracing::debug!(platform_id = %key, "post deleted upstream");
                return Ok(None);
            }
            Err(FetchError::Cancelled) => return Ok(None),
            Err(e @ FetchError::RateLimited) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(platform_id = %key, error = %e, "post fetch failed");
                return Ok(None);
            }
        };

        let detail = match parse_post_detail(&html) {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(platform_id = %key, error = %e, "post parse failed");
                return Ok(None);
            }
        };

        let record = self
            .repository
            .insert_post(self.post_input(key, &url, &detail))
            .await?;

        let mut comments = 0;
        if record.comment_cnt > 0 {
            comments = collector.collect(&record, key, &detail.esno).await?;
        }

        Ok(Some(comments))
    }

    /// Refresh comment threads of recently stored posts
    ///
    /// Uses the same fetcher, parsers, and dedup rules as the main pass;
    /// `update_post_comment_count` is its only post mutation.
    async fn rehydrate(
        &self,
        expiration: DateTime<FixedOffset>,
        report: &mut CrawlReport,
    ) -> Result<(), CrawlerError> {
        let recent = self
            .repository
            .list_recent_posts(&self.options.scenario_id, expiration)
            .await?;
        tracing::info!(count = recent.len(), since = %expiration, "rehydrating recent posts");

        let endpoint = format!("{}/board/comment/", self.base_url);
        let collector = CommentCollector {
            fetcher: &self.fetcher,
            repository: &*self.repository,
            endpoint: &endpoint,
            comment_delay_ms: self.config.crawler.comment_delay_ms,
            cancel: &self.cancel,
        };

        for lean in recent {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            polite_sleep(self.config.crawler.detail_delay_ms).await;

            let Ok(key) = lean.platform_post_id.parse::<PostKey>() else {
                tracing::warn!(platform_id = %lean.platform_post_id, "stored platform id does not parse");
                continue;
            };

            let html = match self.fetcher.get(&self.view_url(&key)).await {
                Ok(html) => html,
                Err(FetchError::NotFound) => continue,
                Err(FetchError::Cancelled) => return Ok(()),
                Err(e @ FetchError::RateLimited) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(platform_id = %key, error = %e, "rehydrate fetch failed");
                    continue;
                }
            };
            let detail = match parse_post_detail(&html) {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!(platform_id = %key, error = %e, "rehydrate parse failed");
                    continue;
                }
            };

            if detail.comment_cnt != lean.comment_cnt {
                self.repository
                    .update_post_comment_count(&lean.id, detail.comment_cnt)
                    .await?;
            }
            if detail.comment_cnt > 0 {
                let Some(record) = self
                    .repository
                    .find_post_by_platform_id(&self.options.scenario_id, &lean.platform_post_id)
                    .await?
                else {
                    continue;
                };
                report.saved_comments += collector.collect(&record, &key, &detail.esno).await?;
            }
        }

        Ok(())
    }

    /// View URL for a key on this run's origin
    ///
    /// Identical to the codec's canonical URL when the run targets the real
    /// site; keeps mock-server runs on the mock origin.
    fn view_url(&self, key: &PostKey) -> String {
        format!(
            "{}{}?id={}&no={}",
            self.base_url,
            key.gall_type.view_path(),
            key.gallery_id,
            key.post_no
        )
    }

    fn post_input(&self, key: &PostKey, url: &str, detail: &PostDetail) -> PostInput {
        PostInput {
            scenario_id: self.options.scenario_id.clone(),
            platform_post_id: key.platform_id(),
            url: url.to_string(),
            title: detail.title.clone(),
            contents: detail.contents.clone(),
            writer: detail.writer.clone(),
            writer_id: detail.writer_id.clone(),
            writer_ip: detail.writer_ip.clone(),
            written_at: detail.written_at,
            like_cnt: detail.like_cnt,
            dislike_cnt: detail.dislike_cnt,
            comment_cnt: detail.comment_cnt,
        }
    }

    /// Liveness log on a fixed interval, aborted on every exit path
    fn spawn_heartbeat(&self) -> tokio::task::JoinHandle<()> {
        let scenario = self.options.scenario_id.clone();
        let period = self.config.heartbeat_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                tracing::info!(scenario = %scenario, "crawler heartbeat");
            }
        })
    }
}

/// Origin of `url`, or `fallback` when it has none
fn origin_or(url: &str, fallback: &str) -> String {
    ::url::Url::parse(url)
        .ok()
        .map(|u| u.origin())
        .filter(|origin| origin.is_tuple())
        .map(|origin| origin.ascii_serialization())
        .unwrap_or_else(|| fallback.trim_end_matches('/').to_string())
}
