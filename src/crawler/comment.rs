//! Comment API client
//!
//! Comments live behind a form POST to `/board/comment/`, paginated by a
//! 1-indexed `comment_page` and keyed by the ESNO token harvested from the
//! post page. An empty comment list is the normal end of the thread. Each
//! fetched page becomes at most one bulk insert, preserving upstream order.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::crawler::fetcher::DcFetcher;
use crate::error::{CrawlerError, FetchError, ParseError};
use crate::models::PostKey;
use crate::parser::date::parse_comment_datetime;
use crate::parser::sanitize::{has_content, strip_html};
use crate::storage::{CommentInput, PostRecord, PostRepository};
use crate::utils::polite_sleep;

/// One comment as the API returns it
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    /// Comment number; control rows omit it
    #[serde(default, deserialize_with = "de_opt_string")]
    pub no: Option<String>,

    /// `"Y"` marks a deleted comment
    #[serde(default)]
    pub del_yn: Option<String>,

    /// Comment body as an HTML snippet
    #[serde(default)]
    pub memo: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ip: Option<String>,

    #[serde(default)]
    pub reg_date: Option<String>,
}

/// The API answers `{"comments": [...]}`, but a bare array has been observed
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommentPayload {
    Object {
        #[serde(default)]
        comments: Vec<RawComment>,
    },
    List(Vec<RawComment>),
}

/// Parse one comment API response
pub fn parse_comment_page(json: &str) -> Result<Vec<RawComment>, ParseError> {
    serde_json::from_str::<CommentPayload>(json)
        .map(|payload| match payload {
            CommentPayload::Object { comments } => comments,
            CommentPayload::List(comments) => comments,
        })
        .map_err(|_| ParseError::UnknownFormat)
}

/// Form body for one comment page request
pub fn build_comment_form(key: &PostKey, esno: &str, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("id", key.gallery_id.clone()),
        ("no", key.post_no.to_string()),
        ("cmt_id", key.gallery_id.clone()),
        ("cmt_no", key.post_no.to_string()),
        ("focus_cno", String::new()),
        ("focus_pno", String::new()),
        ("e_s_n_o", esno.to_string()),
        ("comment_page", page.to_string()),
        ("sort", "N".to_string()),
        ("prevCnt", String::new()),
        ("board_type", String::new()),
        ("_GALLTYPE_", key.gall_type.letter().to_string()),
    ]
}

/// Pages through one post's comment thread and persists it
pub struct CommentCollector<'a> {
    pub fetcher: &'a DcFetcher,
    pub repository: &'a dyn PostRepository,
    /// Absolute URL of the comment endpoint (`<base>/board/comment/`)
    pub endpoint: &'a str,
    pub comment_delay_ms: u64,
    pub cancel: &'a CancellationToken,
}

impl CommentCollector<'_> {
    /// Walk the comment pages of `post`; returns the number of comments saved
    ///
    /// Fetch and parse failures end the loop quietly; backend failures
    /// propagate.
    pub async fn collect(
        &self,
        post: &PostRecord,
        key: &PostKey,
        esno: &str,
    ) -> Result<usize, CrawlerError> {
        let mut saved = 0;
        let mut page: u32 = 1;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let form = build_comment_form(key, esno, page);
            let body = match self.fetcher.post_form(self.endpoint, &form).await {
                Ok(body) => body,
                Err(FetchError::Cancelled) => break,
                Err(e) => {
                    tracing::warn!(platform_id = %key, page, error = %e, "comment page fetch failed");
                    break;
                }
            };

            let raw_comments = match parse_comment_page(&body) {
                Ok(comments) => comments,
                Err(e) => {
                    tracing::warn!(platform_id = %key, page, error = %e, "comment page parse failed");
                    break;
                }
            };

            if raw_comments.is_empty() {
                break;
            }

            let inputs = self.convert_page(post, key, &raw_comments).await?;
            if !inputs.is_empty() {
                self.repository.insert_comments_bulk(&inputs).await?;
                saved += inputs.len();
            }
            tracing::debug!(platform_id = %key, page, fetched = raw_comments.len(), kept = inputs.len(), "comment page done");

            page += 1;
            polite_sleep(self.comment_delay_ms).await;
        }

        Ok(saved)
    }

    /// Filter one raw page down to the rows worth persisting
    async fn convert_page(
        &self,
        post: &PostRecord,
        key: &PostKey,
        raw_comments: &[RawComment],
    ) -> Result<Vec<CommentInput>, CrawlerError> {
        let mut inputs = Vec::new();

        for raw in raw_comments {
            // Control rows carry no comment number
            let Some(no) = &raw.no else {
                continue;
            };
            if raw.del_yn.as_deref() == Some("Y") {
                continue;
            }

            let platform_comment_id = key.comment_id(no);
            if self
                .repository
                .comment_exists(&post.scenario_id, &platform_comment_id)
                .await?
            {
                continue;
            }

            let contents = strip_html(&raw.memo);
            if !has_content(&contents) {
                continue;
            }

            let written_at = match raw
                .reg_date
                .as_deref()
                .ok_or(ParseError::MissingField("reg_date"))
                .and_then(parse_comment_datetime)
            {
                Ok(dt) => dt,
                Err(e) => {
                    tracing::warn!(comment_id = %platform_comment_id, error = %e, "skipping comment with bad date");
                    continue;
                }
            };

            inputs.push(CommentInput {
                platform_comment_id,
                post_id: post.id.clone(),
                scenario_id: post.scenario_id.clone(),
                writer: non_empty(raw.name.clone()),
                writer_id: non_empty(raw.user_id.clone()),
                writer_ip: non_empty(raw.ip.clone()),
                contents,
                url: post.url.clone(),
                gallery: key.gallery_key(),
                written_at,
            });
        }

        Ok(inputs)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accept the comment number as a string, a bare integer, or null
fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
