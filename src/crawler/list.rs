//! Listing walker
//!
//! Traverses a scenario's listing pages in blocks: the current page, then
//! every per-page link inside the pagination block, then the next-block
//! link. Rows are ingested as they appear; the walk ends at the pagination
//! boundary, at the date cutoff, or at the first post the repository already
//! holds for this scenario (the incremental frontier).

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use tokio_util::sync::CancellationToken;

use crate::crawler::fetcher::DcFetcher;
use crate::crawler::url::url_to_post_key;
use crate::error::{CrawlerError, FetchError};
use crate::models::PostKey;
use crate::parser::{parse_listing_rows, parse_pagination, ListingMode};
use crate::storage::PostRepository;
use crate::utils::polite_sleep;

pub struct ListingWalker<'a> {
    pub fetcher: &'a DcFetcher,
    pub repository: &'a dyn PostRepository,
    pub scenario_id: &'a str,
    pub mode: ListingMode,
    /// Base for resolving relative hrefs
    pub base_url: &'a str,
    pub date_from: Option<DateTime<FixedOffset>>,
    pub listing_delay_ms: u64,
    pub cancel: &'a CancellationToken,
}

impl ListingWalker<'_> {
    /// Walk listing pages starting at `start_url`, returning the queued keys
    pub async fn walk(&self, start_url: &str) -> Result<HashSet<PostKey>, CrawlerError> {
        let mut queued = HashSet::new();
        let mut current = start_url.to_string();
        let mut block = 0usize;

        'blocks: loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let html = match self.fetcher.get(&current).await {
                Ok(html) => html,
                Err(FetchError::Cancelled) => break,
                Err(e) => return Err(e.into()),
            };
            block += 1;

            if self.ingest_rows(&html, &mut queued).await? {
                break;
            }

            let links = parse_pagination(&html, self.mode, self.base_url);
            tracing::debug!(block, pages = links.pages.len(), "walking pagination block");

            for page_url in &links.pages {
                if self.cancel.is_cancelled() {
                    break 'blocks;
                }
                polite_sleep(self.listing_delay_ms).await;

                let html = match self.fetcher.get(page_url).await {
                    Ok(html) => html,
                    Err(FetchError::Cancelled) => break 'blocks,
                    Err(e) => return Err(e.into()),
                };
                if self.ingest_rows(&html, &mut queued).await? {
                    break 'blocks;
                }
            }

            match links.next_block {
                Some(next) => {
                    polite_sleep(self.listing_delay_ms).await;
                    current = next;
                }
                None => break,
            }
        }

        tracing::info!(
            scenario = self.scenario_id,
            queued = queued.len(),
            blocks = block,
            "listing walk finished"
        );
        Ok(queued)
    }

    /// Feed one page of rows into the queue
    ///
    /// Returns `true` when the walk should stop: the date cutoff was passed
    /// or the incremental frontier was reached. Rows that fail to decode are
    /// skipped.
    async fn ingest_rows(
        &self,
        html: &str,
        queued: &mut HashSet<PostKey>,
    ) -> Result<bool, CrawlerError> {
        let rows = parse_listing_rows(html, self.mode, self.base_url);

        for row in rows {
            if let (Some(date_from), Some(written_at)) = (self.date_from, row.written_at) {
                if written_at < date_from {
                    tracing::info!(%written_at, "row older than date_from, stopping walk");
                    return Ok(true);
                }
            }

            let key = match url_to_post_key(&row.url) {
                Ok(key) => key,
                Err(e) => {
                    tracing::debug!(url = %row.url, error = %e, "skipping undecodable row");
                    continue;
                }
            };

            let existing = self
                .repository
                .find_post_by_platform_id(self.scenario_id, &key.platform_id())
                .await?;
            if existing.is_some() {
                tracing::info!(platform_id = %key, "incremental boundary reached, stopping walk");
                return Ok(true);
            }

            queued.insert(key);
        }

        Ok(false)
    }
}
