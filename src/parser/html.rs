//! Listing and post view page parsers
//!
//! The listing parser normalizes the two board layouts (keyword-search table
//! rows and gallog list items) into candidate post rows, filtering out the
//! notice and ad rows DCInside interleaves with real posts. The view parser
//! extracts the full post detail together with the ESNO token the comment
//! API requires.

use chrono::{DateTime, FixedOffset};
use scraper::{ElementRef, Html};

use crate::crawler::url::to_absolute;
use crate::error::ParseError;
use crate::parser::date::{parse_date_only, parse_datetime};
use crate::parser::sanitize::strip_html;
use crate::parser::selectors;
use crate::utils::trailing_int;

/// Listing layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// `table.gall_list` rows on a gallery listing or search result
    Keyword,
    /// `ul.cont_listbox` items on a gallog posting page
    Gallog,
}

/// One candidate post discovered on a listing page
#[derive(Debug, Clone)]
pub struct ListingRow {
    /// Absolute post view URL
    pub url: String,
    /// Row date; listing rows carry date precision only
    pub written_at: Option<DateTime<FixedOffset>>,
}

/// Links extracted from a pagination block
#[derive(Debug, Clone, Default)]
pub struct PaginationLinks {
    /// Per-page links inside the current block, in document order
    pub pages: Vec<String>,
    /// `page_next` / `search_next` link advancing to the next block
    pub next_block: Option<String>,
}

/// Full post detail extracted from a view page
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post_no: u64,
    /// Opaque token required by the comment API
    pub esno: String,
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

/// Parse the post rows of a listing page
///
/// Rows that are notices, ads, or otherwise unlinkable are dropped; rows
/// whose date cannot be parsed are kept with `written_at = None`.
pub fn parse_listing_rows(html: &str, mode: ListingMode, base_url: &str) -> Vec<ListingRow> {
    let document = Html::parse_document(html);
    let row_selector = match mode {
        ListingMode::Keyword => &*selectors::KEYWORD_ROWS,
        ListingMode::Gallog => &*selectors::GALLOG_ROWS,
    };

    document
        .select(row_selector)
        .filter(|row| is_post_row(row))
        .filter_map(|row| parse_row(&row, mode, base_url))
        .collect()
}

/// Distinguish a post row from notices and ads
///
/// A real post row carries a `data-no` attribute, or a purely numeric number
/// cell that is not the notice marker.
fn is_post_row(row: &ElementRef) -> bool {
    if row.value().attr("data-no").is_some() {
        return true;
    }

    row.select(&selectors::ROW_NUM_CELL)
        .next()
        .map(|cell| {
            let text: String = cell.text().collect::<String>().trim().to_string();
            !text.is_empty()
                && !text.contains("공지")
                && text.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}

fn parse_row(row: &ElementRef, mode: ListingMode, base_url: &str) -> Option<ListingRow> {
    let href = select_row_link(row)?;
    let url = to_absolute(href, base_url)?;
    let written_at = parse_row_date(row, mode);
    Some(ListingRow { url, written_at })
}

/// Pick the post link: prefer a `/board/view` href, then the title cell's
/// anchor, then any anchor at all
fn select_row_link<'b>(row: &ElementRef<'b>) -> Option<&'b str> {
    let anchors: Vec<ElementRef> = row.select(&selectors::ANCHOR).collect();

    if let Some(a) = anchors
        .iter()
        .find(|a| a.value().attr("href").is_some_and(|h| h.contains("/board/view")))
    {
        return a.value().attr("href");
    }

    if let Some(a) = row
        .select(&selectors::ROW_TITLE_CELL)
        .next()
        .and_then(|cell| cell.select(&selectors::ANCHOR).next())
    {
        return a.value().attr("href");
    }

    anchors.first().and_then(|a| a.value().attr("href"))
}

fn parse_row_date(row: &ElementRef, mode: ListingMode) -> Option<DateTime<FixedOffset>> {
    match mode {
        ListingMode::Keyword => {
            // The title attribute holds a full timestamp; rows only display
            // the clock time, so the date portion pinned to midnight is the
            // usable precision.
            let cell = row.select(&selectors::ROW_DATE_CELL).next()?;
            let title = cell.value().attr("title")?;
            let date_part = title.split_whitespace().next()?;
            parse_date_only(date_part).ok()
        }
        ListingMode::Gallog => {
            let cell = row.select(&selectors::GALLOG_ROW_DATE).next()?;
            let text: String = cell.text().collect();
            parse_date_only(&text).ok()
        }
    }
}

/// Parse the pagination block of a listing page
///
/// Per-page links carry no CSS class; any classed anchor is block navigation,
/// of which `page_next` / `search_next` advance to the following block.
pub fn parse_pagination(html: &str, mode: ListingMode, base_url: &str) -> PaginationLinks {
    let document = Html::parse_document(html);
    let block_selector = match mode {
        ListingMode::Keyword => &*selectors::KEYWORD_PAGING,
        ListingMode::Gallog => &*selectors::GALLOG_PAGING,
    };

    let Some(block) = document.select(block_selector).next() else {
        return PaginationLinks::default();
    };

    let mut links = PaginationLinks::default();
    for anchor in block.select(&selectors::ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let class = anchor.value().attr("class").unwrap_or("");

        if class.split_whitespace().any(|c| c == "page_next" || c == "search_next") {
            if links.next_block.is_none() {
                links.next_block = to_absolute(href, base_url);
            }
        } else if class.trim().is_empty() {
            if let Some(url) = to_absolute(href, base_url) {
                links.pages.push(url);
            }
        }
        // other classed anchors (first/prev block) are navigation noise
    }

    links
}

/// Parse a post view page
///
/// # Errors
///
/// Returns `ParseError::PostNotFound` when the view form is missing, which
/// is how deleted posts render under a 200 response, and
/// `ParseError::MissingField` for structurally broken pages.
pub fn parse_post_detail(html: &str) -> Result<PostDetail, ParseError> {
    let document = Html::parse_document(html);

    let form = document
        .select(&selectors::VIEW_FORM)
        .next()
        .ok_or(ParseError::PostNotFound)?;

    let post_no = form
        .select(&selectors::VIEW_POST_NO)
        .next()
        .and_then(|e| e.value().attr("value"))
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or(ParseError::MissingField("no"))?;

    let esno = form
        .select(&selectors::VIEW_ESNO)
        .next()
        .and_then(|e| e.value().attr("value"))
        .map(str::to_string)
        .ok_or(ParseError::MissingField("e_s_n_o"))?;

    let title = document
        .select(&selectors::VIEW_TITLE)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingField("title"))?;

    // Image-only posts legitimately strip to an empty body
    let contents = document
        .select(&selectors::VIEW_CONTENT)
        .next()
        .map(|e| strip_html(&e.inner_html()))
        .ok_or(ParseError::MissingField("write_div"))?;

    let writer_box = document
        .select(&selectors::VIEW_WRITER)
        .next()
        .ok_or(ParseError::MissingField("gall_writer"))?;
    let writer = non_empty_attr(&writer_box, "data-nick");
    let writer_id = non_empty_attr(&writer_box, "data-uid");
    let writer_ip = non_empty_attr(&writer_box, "data-ip");

    let written_at = document
        .select(&selectors::VIEW_DATE)
        .next()
        .and_then(|e| {
            let raw = e
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| e.text().collect::<String>());
            parse_datetime(raw.trim()).ok()
        })
        .ok_or(ParseError::MissingField("gall_date"))?;

    let like_cnt = document
        .select(&selectors::recommend_up(post_no))
        .next()
        .and_then(|e| trailing_int(&e.text().collect::<String>()))
        .unwrap_or(0);

    let dislike_cnt = document
        .select(&selectors::recommend_down(post_no))
        .next()
        .and_then(|e| trailing_int(&e.text().collect::<String>()));

    let comment_cnt = document
        .select(&selectors::VIEW_COMMENT_COUNT)
        .next()
        .and_then(|e| trailing_int(&e.text().collect::<String>()))
        .unwrap_or(0);

    Ok(PostDetail {
        post_no,
        esno,
        title,
        contents,
        writer,
        writer_id,
        writer_ip,
        written_at,
        like_cnt,
        dislike_cnt,
        comment_cnt,
    })
}

fn non_empty_attr(element: &ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
