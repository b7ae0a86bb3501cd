//! pado - DCInside gallery crawler
//!
//! An incremental crawler for DCInside galleries: it walks paginated
//! listings, queues posts up to the boundary of what is already persisted,
//! fetches each post page, and pages through the comment API, writing
//! everything through a pluggable repository.
//!
//! # Architecture
//!
//! - [`config`] - Environment/TOML configuration and crawl-mode resolution
//! - [`crawler`] - Fetcher, URL codec, listing walker, comment collector, engine
//! - [`parser`] - Listing/post-view HTML parsers and KST date handling
//! - [`models`] - Core data structures and platform ID types
//! - [`storage`] - Repository port and reference backends
//! - [`error`] - Error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pado::config::Config;
//! use pado::crawler::DcCrawler;
//! use pado::models::CrawlOptions;
//! use pado::storage::MemoryRepository;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let options = CrawlOptions {
//!         scenario_id: "scenario-1".into(),
//!         crawler_code: "dc-keyword".into(),
//!         keyword: Some("러스트".into()),
//!         target: Some("programming".into()),
//!         ..Default::default()
//!     };
//!     let repository = Arc::new(MemoryRepository::new());
//!     let crawler = DcCrawler::new(config, options, repository)?;
//!     let report = crawler.start_crawling().await?;
//!     println!("saved {} posts", report.saved_posts);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::DcCrawler;
    pub use crate::error::{CrawlerError, FetchError, ParseError, Result};
    pub use crate::models::{CrawlMode, CrawlOptions, CrawlReport, GalleryType, PostKey};
    pub use crate::storage::{JsonlRepository, MemoryRepository, PostRepository};
}

pub use models::{CrawlMode, CrawlOptions, CrawlReport, GalleryType, PostKey};
