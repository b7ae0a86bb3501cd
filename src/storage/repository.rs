//! Repository abstraction for post and comment persistence
//!
//! The crawl engine depends on this trait alone; backends decide layout and
//! transactions. Each operation is assumed logically atomic per call, and no
//! cross-call transaction is assumed by the engine.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use super::{CommentInput, LeanPost, PostInput, PostRecord};

/// Persistence port consumed by the crawl engine
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Incremental boundary check: the post row for this scenario, if any
    async fn find_post_by_platform_id(
        &self,
        scenario_id: &str,
        platform_post_id: &str,
    ) -> Result<Option<PostRecord>>;

    /// Create a post row; returns the stored row with its surrogate id
    async fn insert_post(&self, input: PostInput) -> Result<PostRecord>;

    /// Rehydrate-phase comment count refresh
    async fn update_post_comment_count(&self, post_id: &str, comment_cnt: i64) -> Result<()>;

    /// Posts written since `since`, the rehydrate working set
    async fn list_recent_posts(
        &self,
        scenario_id: &str,
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<LeanPost>>;

    /// Page-granular comment batch append
    async fn insert_comments_bulk(&self, inputs: &[CommentInput]) -> Result<()>;

    /// Comment dedup check within persistence
    async fn comment_exists(&self, scenario_id: &str, platform_comment_id: &str) -> Result<bool>;
}

/// In-memory reference backend
///
/// Used by the test suites and as the model implementation of the port
/// contract. Keys follow the persisted uniqueness rules:
/// `(scenario_id, platform_post_id)` for posts and
/// `(scenario_id, platform_comment_id)` for comments.
#[derive(Default)]
pub struct MemoryRepository {
    posts: RwLock<HashMap<(String, String), PostRecord>>,
    comments: RwLock<Vec<CommentInput>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post row, for boundary tests
    pub fn seed_post(&self, record: PostRecord) {
        self.posts.write().unwrap().insert(
            (record.scenario_id.clone(), record.platform_post_id.clone()),
            record,
        );
    }

    /// All stored posts (for assertions)
    pub fn all_posts(&self) -> Vec<PostRecord> {
        self.posts.read().unwrap().values().cloned().collect()
    }

    /// All stored comments in insertion order (for assertions)
    pub fn all_comments(&self) -> Vec<CommentInput> {
        self.comments.read().unwrap().clone()
    }
}

#[async_trait]
impl PostRepository for MemoryRepository {
    async fn find_post_by_platform_id(
        &self,
        scenario_id: &str,
        platform_post_id: &str,
    ) -> Result<Option<PostRecord>> {
        Ok(self
            .posts
            .read()
            .unwrap()
            .get(&(scenario_id.to_string(), platform_post_id.to_string()))
            .cloned())
    }

    async fn insert_post(&self, input: PostInput) -> Result<PostRecord> {
        let key = (input.scenario_id.clone(), input.platform_post_id.clone());
        let mut posts = self.posts.write().unwrap();
        if posts.contains_key(&key) {
            anyhow::bail!("duplicate post: {}", key.1);
        }
        let record = PostRecord::from_input(Uuid::new_v4().to_string(), input);
        posts.insert(key, record.clone());
        Ok(record)
    }

    async fn update_post_comment_count(&self, post_id: &str, comment_cnt: i64) -> Result<()> {
        let mut posts = self.posts.write().unwrap();
        let post = posts
            .values_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| anyhow::anyhow!("unknown post id: {post_id}"))?;
        post.comment_cnt = comment_cnt;
        Ok(())
    }

    async fn list_recent_posts(
        &self,
        scenario_id: &str,
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<LeanPost>> {
        Ok(self
            .posts
            .read()
            .unwrap()
            .values()
            .filter(|p| p.scenario_id == scenario_id && p.written_at >= since)
            .map(LeanPost::from)
            .collect())
    }

    async fn insert_comments_bulk(&self, inputs: &[CommentInput]) -> Result<()> {
        self.comments.write().unwrap().extend_from_slice(inputs);
        Ok(())
    }

    async fn comment_exists(&self, scenario_id: &str, platform_comment_id: &str) -> Result<bool> {
        Ok(self
            .comments
            .read()
            .unwrap()
            .iter()
            .any(|c| c.scenario_id == scenario_id && c.platform_comment_id == platform_comment_id))
    }
}
