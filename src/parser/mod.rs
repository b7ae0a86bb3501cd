//! HTML and date parsing for DCInside pages
//!
//! - [`html`] - listing row, pagination, and post view parsers
//! - [`date`] - KST timestamp normalization across the upstream formats
//! - [`sanitize`] - HTML-to-plain-text stripping
//! - [`selectors`] - precompiled CSS selectors

pub mod date;
pub mod html;
pub mod sanitize;
pub mod selectors;

pub use html::{
    parse_listing_rows, parse_pagination, parse_post_detail, ListingMode, ListingRow,
    PaginationLinks, PostDetail,
};
pub use sanitize::{has_content, strip_html};
