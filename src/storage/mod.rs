//! Storage records and the repository port
//!
//! The engine persists through the [`repository::PostRepository`] trait and
//! never touches a concrete backend directly. Two reference backends ship
//! with the crate: [`repository::MemoryRepository`] for tests and
//! [`jsonl::JsonlRepository`] for the binary.

pub mod jsonl;
pub mod repository;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub use jsonl::JsonlRepository;
pub use repository::{MemoryRepository, PostRepository};

/// Post row as handed to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInput {
    pub scenario_id: String,
    pub platform_post_id: String,
    pub url: String,
    pub title: String,
    pub contents: String,
    pub writer: Option<String>,
    pub writer_id: Option<String>,
    pub writer_ip: Option<String>,
    pub written_at: DateTime<FixedOffset>,
    pub like_cnt: i64,
    pub dislike_cnt: Option<i64>,
    pub comment_cnt: i64,
}

/// Stored post row, including the backend surrogate id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    /// Backend surrogate id, referenced by comment rows
    pub id: String,
    pub scenario_id: String,
    pub platform_post_id: String,
    pub url: String,
    pub title: String,
    pub contents: String,
    pub writer: Option<String>,
    pub writer_id: Option<String>,
    pub writer_ip: Option<String>,
    pub written_at: DateTime<FixedOffset>,
    pub like_cnt: i64,
    pub dislike_cnt: Option<i64>,
    pub comment_cnt: i64,
}

impl PostRecord {
    pub fn from_input(id: impl Into<String>, input: PostInput) -> Self {
        Self {
            id: id.into(),
            scenario_id: input.scenario_id,
            platform_post_id: input.platform_post_id,
            url: input.url,
            title: input.title,
            contents: input.contents,
            writer: input.writer,
            writer_id: input.writer_id,
            writer_ip: input.writer_ip,
            written_at: input.written_at,
            like_cnt: input.like_cnt,
            dislike_cnt: input.dislike_cnt,
            comment_cnt: input.comment_cnt,
        }
    }
}

/// Comment row as handed to the backend, batched per comment page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentInput {
    pub platform_comment_id: String,
    /// Surrogate id of the owning post row
    pub post_id: String,
    pub scenario_id: String,
    pub writer: Option<String>,
    pub writer_id: Option<String>,
    pub writer_ip: Option<String>,
    /// Plain text, HTML already stripped, never empty
    pub contents: String,
    /// URL of the post the comment belongs to
    pub url: String,
    /// `<gallType>&<galleryId>`
    pub gallery: String,
    pub written_at: DateTime<FixedOffset>,
}

/// Slim post projection used by the rehydrate phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeanPost {
    pub id: String,
    pub platform_post_id: String,
    pub url: String,
    pub comment_cnt: i64,
}

impl From<&PostRecord> for LeanPost {
    fn from(post: &PostRecord) -> Self {
        Self {
            id: post.id.clone(),
            platform_post_id: post.platform_post_id.clone(),
            url: post.url.clone(),
            comment_cnt: post.comment_cnt,
        }
    }
}
