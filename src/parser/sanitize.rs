//! Text sanitization for comment bodies and post contents
//!
//! Comments arrive from the API as HTML snippets; post bodies are extracted
//! from the view page. Both are reduced to plain text: tags removed, entities
//! decoded, invisible characters dropped, whitespace collapsed.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BR_REGEX: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref SPACE_REGEX: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref MULTI_NEWLINE_REGEX: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Strip an HTML snippet down to its visible plain text
pub fn strip_html(html: &str) -> String {
    let with_breaks = BR_REGEX.replace_all(html, "\n");
    let no_tags = TAG_REGEX.replace_all(&with_breaks, "");
    // &nbsp; decodes to U+00A0, which the space collapse would not catch
    let decoded = html_escape::decode_html_entities(&no_tags).replace('\u{A0}', " ");
    let visible = remove_invisible(&decoded);
    let spaced = SPACE_REGEX.replace_all(&visible, " ");

    let trimmed: String = spaced
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    MULTI_NEWLINE_REGEX
        .replace_all(&trimmed, "\n\n")
        .trim()
        .to_string()
}

/// Drop zero-width characters and control characters other than newline/tab
fn remove_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Check that a string holds something beyond whitespace
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_and_entities() {
        let html = "<b>굵은</b> 텍스트와 <a href='#'>링크</a> &amp; &lt;기호&gt;";
        assert_eq!(strip_html(html), "굵은 텍스트와 링크 & <기호>");
    }

    #[test]
    fn test_br_becomes_newline() {
        assert_eq!(strip_html("윗줄<br>아랫줄"), "윗줄\n아랫줄");
        assert_eq!(strip_html("윗줄<BR />아랫줄"), "윗줄\n아랫줄");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(strip_html("여러   공백이    있는   텍스트"), "여러 공백이 있는 텍스트");
        assert_eq!(strip_html("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_invisible_characters_removed() {
        let dirty = "가\u{200B}나\u{FEFF}다\u{0007}라";
        assert_eq!(strip_html(dirty), "가나다라");
    }

    #[test]
    fn test_image_only_comment_strips_to_empty() {
        let html = r#"<img src="https://dcimg.example/x.gif">"#;
        assert_eq!(strip_html(html), "");
        assert!(!has_content(&strip_html(html)));
    }

    #[test]
    fn test_has_content() {
        assert!(has_content("본문"));
        assert!(!has_content("   \n\t "));
    }
}
