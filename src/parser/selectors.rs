//! CSS selectors for DCInside listing and post view pages
//!
//! Keyword-mode listings are classic board tables; gallog listings are the
//! simplified list markup on a user's posting page. Both share the paging
//! block structure.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at startup
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    // Listing rows
    pub static ref KEYWORD_ROWS: Selector = parse_selector!("table.gall_list > tbody > tr");
    pub static ref GALLOG_ROWS: Selector = parse_selector!("ul.cont_listbox > li");

    // Row cells
    pub static ref ROW_NUM_CELL: Selector = parse_selector!("td.gall_num");
    pub static ref ROW_TITLE_CELL: Selector = parse_selector!("td.gall_tit");
    pub static ref ROW_DATE_CELL: Selector = parse_selector!("td.gall_date");
    pub static ref GALLOG_ROW_DATE: Selector = parse_selector!("span.date");
    pub static ref ANCHOR: Selector = parse_selector!("a");

    // Pagination
    pub static ref KEYWORD_PAGING: Selector = parse_selector!("div.bottom_paging_box.iconpaging");
    pub static ref GALLOG_PAGING: Selector =
        parse_selector!("div.cont_box div.bottom_paging_box.iconpaging");

    // Post view page
    pub static ref VIEW_FORM: Selector = parse_selector!("form#_view_form_");
    pub static ref VIEW_POST_NO: Selector = parse_selector!("input#no");
    pub static ref VIEW_ESNO: Selector = parse_selector!("input#e_s_n_o");
    pub static ref VIEW_TITLE: Selector = parse_selector!("span.title_subject");
    pub static ref VIEW_CONTENT: Selector = parse_selector!("div.write_div");
    pub static ref VIEW_WRITER: Selector = parse_selector!("div.gall_writer");
    pub static ref VIEW_DATE: Selector = parse_selector!("span.gall_date");
    pub static ref VIEW_COMMENT_COUNT: Selector = parse_selector!("span.gall_comment");
}

/// Like-count element carries the post number in its id
pub fn recommend_up(post_no: u64) -> Selector {
    Selector::parse(&format!("p#recommend_view_up_{post_no}"))
        .expect("recommend up selector is valid")
}

/// Dislike-count element; absent on galleries without downvotes
pub fn recommend_down(post_no: u64) -> Selector {
    Selector::parse(&format!("p#recommend_view_down_{post_no}"))
        .expect("recommend down selector is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_selectors_compile() {
        // lazy_static defers the parse; touch each one
        let _ = &*KEYWORD_ROWS;
        let _ = &*GALLOG_ROWS;
        let _ = &*KEYWORD_PAGING;
        let _ = &*GALLOG_PAGING;
        let _ = &*VIEW_FORM;
        let _ = &*VIEW_WRITER;
    }

    #[test]
    fn test_dynamic_recommend_selectors() {
        let html = scraper::Html::parse_document(
            r#"<p id="recommend_view_up_42">10</p><p id="recommend_view_down_42">2</p>"#,
        );
        assert!(html.select(&recommend_up(42)).next().is_some());
        assert!(html.select(&recommend_down(42)).next().is_some());
        assert!(html.select(&recommend_up(43)).next().is_none());
    }
}
