// Core data structures for the pado crawler

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Gallery variant, derived from the URL path prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GalleryType {
    /// Minor gallery (`/mgallery/`)
    Minor,
    /// Mini gallery (`/mini/`)
    Mini,
    /// General gallery (`/board/`)
    General,
}

impl GalleryType {
    /// Letter code used inside platform IDs and the comment API
    pub fn letter(&self) -> &'static str {
        match self {
            Self::Minor => "M",
            Self::Mini => "MI",
            Self::General => "G",
        }
    }

    /// Parse from the platform-ID letter code
    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Minor),
            "MI" => Some(Self::Mini),
            "G" => Some(Self::General),
            _ => None,
        }
    }

    /// Path of the post view endpoint for this gallery type
    pub fn view_path(&self) -> &'static str {
        match self {
            Self::Minor => "/mgallery/board/view",
            Self::Mini => "/mini/board/view",
            Self::General => "/board/view",
        }
    }
}

impl fmt::Display for GalleryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Decomposed platform post ID
///
/// Renders as `DC&<gallType>&<galleryId>&<postNo>` and parses back. The
/// ordering is the collector's processing order: gallery type letter, then
/// gallery id, both lexicographic, then post number numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostKey {
    pub gall_type: GalleryType,
    pub gallery_id: String,
    pub post_no: u64,
}

impl PostKey {
    pub fn new(gall_type: GalleryType, gallery_id: impl Into<String>, post_no: u64) -> Self {
        Self {
            gall_type,
            gallery_id: gallery_id.into(),
            post_no,
        }
    }

    /// Canonical platform post ID string
    pub fn platform_id(&self) -> String {
        format!("DC&{}&{}&{}", self.gall_type, self.gallery_id, self.post_no)
    }

    /// Platform comment ID for a comment number under this post
    pub fn comment_id(&self, comment_no: &str) -> String {
        format!("{}&{}", self.platform_id(), comment_no)
    }

    /// Gallery key stored on comment rows: `<gallType>&<galleryId>`
    pub fn gallery_key(&self) -> String {
        format!("{}&{}", self.gall_type, self.gallery_id)
    }
}

impl FromStr for PostKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('&').collect();
        let [prefix, letter, gallery_id, post_no] = parts.as_slice() else {
            return Err(ParseError::InvalidUrl(s.to_string()));
        };
        if *prefix != "DC" || gallery_id.is_empty() {
            return Err(ParseError::InvalidUrl(s.to_string()));
        }
        let gall_type = GalleryType::from_letter(letter)
            .ok_or_else(|| ParseError::InvalidUrl(s.to_string()))?;
        let post_no = post_no
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidUrl(s.to_string()))?;
        Ok(Self::new(gall_type, *gallery_id, post_no))
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.platform_id())
    }
}

impl Ord for PostKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.gall_type.letter(), &self.gallery_id, self.post_no).cmp(&(
            other.gall_type.letter(),
            &other.gallery_id,
            other.post_no,
        ))
    }
}

impl PartialOrd for PostKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Site mode for one run, resolved once from environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlMode {
    /// Subject/body keyword search within a target gallery
    Keyword { target: String, keyword: String },
    /// A specific user's gallog posting page
    Gallog { url: String },
    /// An arbitrary listing URL taken verbatim
    Raw { url: String },
}

impl CrawlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword { .. } => "keyword",
            Self::Gallog { .. } => "gallog",
            Self::Raw { .. } => "raw",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied inputs for one run
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Scenario id scoping every persisted row
    pub scenario_id: String,
    /// Crawler code matched against the mode environment variables
    pub crawler_code: String,
    pub url: Option<String>,
    pub keyword: Option<String>,
    pub target: Option<String>,
    /// Posts strictly older than this are not queued
    pub date_from: Option<chrono::DateTime<chrono::FixedOffset>>,
}

/// Summary of one `start_crawling` run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    pub queued_posts: usize,
    pub saved_posts: usize,
    pub skipped_posts: usize,
    pub saved_comments: usize,
    pub cancelled: bool,
}

impl CrawlReport {
    /// Posts that made it into storage, as a percentage of the queue
    pub fn completion_rate(&self) -> f64 {
        if self.queued_posts == 0 {
            100.0
        } else {
            (self.saved_posts as f64 / self.queued_posts as f64) * 100.0
        }
    }
}
