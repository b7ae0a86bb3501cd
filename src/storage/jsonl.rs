//! Append-only JSON-lines backend
//!
//! The binary's default storage: one `posts.jsonl` and one `comments.jsonl`
//! under a data directory, one JSON document per line, with an in-memory
//! index rebuilt on open. The layout matches the engine's lifecycle — rows
//! are only ever appended; a comment-count update appends a corrected copy
//! of the post row, and the last line for a platform id wins on reload.

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use super::{CommentInput, LeanPost, PostInput, PostRecord, PostRepository};

pub struct JsonlRepository {
    posts_path: PathBuf,
    comments_path: PathBuf,
    posts: RwLock<HashMap<(String, String), PostRecord>>,
    comment_ids: RwLock<HashSet<(String, String)>>,
}

impl JsonlRepository {
    /// Open (or create) a data directory and rebuild the in-memory index
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data dir: {}", dir.display()))?;

        let repo = Self {
            posts_path: dir.join("posts.jsonl"),
            comments_path: dir.join("comments.jsonl"),
            posts: RwLock::new(HashMap::new()),
            comment_ids: RwLock::new(HashSet::new()),
        };
        repo.reload()?;
        Ok(repo)
    }

    fn reload(&self) -> Result<()> {
        if self.posts_path.exists() {
            let mut posts = self.posts.write().unwrap();
            for line in read_lines(&self.posts_path)? {
                let record: PostRecord = serde_json::from_str(&line)
                    .with_context(|| format!("Corrupt post row: {line}"))?;
                posts.insert(
                    (record.scenario_id.clone(), record.platform_post_id.clone()),
                    record,
                );
            }
        }

        if self.comments_path.exists() {
            let mut ids = self.comment_ids.write().unwrap();
            for line in read_lines(&self.comments_path)? {
                let comment: CommentInput = serde_json::from_str(&line)
                    .with_context(|| format!("Corrupt comment row: {line}"))?;
                ids.insert((comment.scenario_id, comment.platform_comment_id));
            }
        }

        Ok(())
    }

    fn append_line(path: &Path, value: &impl serde::Serialize) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut line = serde_json::to_string(value)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    BufReader::new(file)
        .lines()
        .filter(|l| l.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(true))
        .map(|l| l.context("Failed to read line"))
        .collect()
}

#[async_trait]
impl PostRepository for JsonlRepository {
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
        {
            let posts = self.posts.read().unwrap();
            if posts.contains_key(&key) {
                anyhow::bail!("duplicate post: {}", key.1);
            }
        }

        let record = PostRecord::from_input(Uuid::new_v4().to_string(), input);
        Self::append_line(&self.posts_path, &record)?;
        self.posts.write().unwrap().insert(key, record.clone());
        Ok(record)
    }

    async fn update_post_comment_count(&self, post_id: &str, comment_cnt: i64) -> Result<()> {
        let mut posts = self.posts.write().unwrap();
        let post = posts
            .values_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| anyhow::anyhow!("unknown post id: {post_id}"))?;
        post.comment_cnt = comment_cnt;
        let snapshot = post.clone();
        drop(posts);
        Self::append_line(&self.posts_path, &snapshot)
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
        for comment in inputs {
            Self::append_line(&self.comments_path, comment)?;
        }
        let mut ids = self.comment_ids.write().unwrap();
        for comment in inputs {
            ids.insert((
                comment.scenario_id.clone(),
                comment.platform_comment_id.clone(),
            ));
        }
        Ok(())
    }

    async fn comment_exists(&self, scenario_id: &str, platform_comment_id: &str) -> Result<bool> {
        Ok(self
            .comment_ids
            .read()
            .unwrap()
            .contains(&(scenario_id.to_string(), platform_comment_id.to_string())))
    }
}
