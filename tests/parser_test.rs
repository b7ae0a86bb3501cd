//! Parser tests over realistic page fixtures

use chrono::TimeZone;
use pado::parser::date::{kst, parse_comment_datetime_in};
use pado::parser::{
    parse_listing_rows, parse_pagination, parse_post_detail, strip_html, ListingMode,
};

const BASE: &str = "https://gall.dcinside.com";

const KEYWORD_LISTING: &str = r#"<html><body>
<table class="gall_list">
  <tbody>
    <tr>
      <td class="gall_num">공지</td>
      <td class="gall_tit"><a href="/board/view/?id=pro&no=3">공지: 갤러리 이용 안내</a></td>
      <td class="gall_date" title="2024-01-01 00:00:00">24.01.01</td>
    </tr>
    <tr data-no="88012">
      <td class="gall_num">88012</td>
      <td class="gall_tit">
        <a href="/board/view/?id=pro&no=88012&page=1">tokio 질문 있습니다</a>
        <a class="reply_numbox" href="/board/view/?id=pro&no=88012&t=cv">[3]</a>
      </td>
      <td class="gall_date" title="2025-06-03 22:10:05">22:10</td>
    </tr>
    <tr>
      <td class="gall_num">88001</td>
      <td class="gall_tit"><a href="/board/view/?id=pro&no=88001">오늘의 코딩</a></td>
      <td class="gall_date" title="2025-06-03 08:00:00">08:00</td>
    </tr>
    <tr>
      <td class="gall_num">설문</td>
      <td class="gall_tit"><a href="https://ad.dcinside.com/survey">설문 배너</a></td>
      <td class="gall_date">-</td>
    </tr>
  </tbody>
</table>
<div class="bottom_paging_box iconpaging">
  <a href="/board/lists/?id=pro&page=1" class="page_first">처음</a>
  <em>1</em>
  <a href="/board/lists/?id=pro&page=2">2</a>
  <a href="/board/lists/?id=pro&page=3">3</a>
  <a href="/board/lists/?id=pro&page=11" class="page_next">다음</a>
</div>
</body></html>"#;

#[test]
fn test_keyword_listing_rows() {
    let rows = parse_listing_rows(KEYWORD_LISTING, ListingMode::Keyword, BASE);

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].url,
        "https://gall.dcinside.com/board/view/?id=pro&no=88012&page=1"
    );
    assert_eq!(
        rows[0].written_at.unwrap(),
        kst().with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap()
    );
    assert!(rows[1].url.contains("no=88001"));
}

#[test]
fn test_keyword_listing_pagination() {
    let links = parse_pagination(KEYWORD_LISTING, ListingMode::Keyword, BASE);

    assert_eq!(links.pages.len(), 2);
    assert!(links.pages[0].ends_with("page=2"));
    assert!(links.pages[1].ends_with("page=3"));
    assert!(links.next_block.unwrap().ends_with("page=11"));
}

const GALLOG_LISTING: &str = r#"<html><body>
<div class="cont_box">
  <ul class="cont_listbox">
    <li data-no="55">
      <a href="https://gall.dcinside.com/mgallery/board/view/?id=rustlang&no=55">첫 번째 글</a>
      <span class="date">2025.05.28</span>
    </li>
    <li data-no="54">
      <a href="https://gall.dcinside.com/mgallery/board/view/?id=rustlang&no=54">두 번째 글</a>
      <span class="date">2025.05.27</span>
    </li>
  </ul>
  <div class="bottom_paging_box iconpaging">
    <a href="/someone/posting?p=2">2</a>
  </div>
</div>
</body></html>"#;

#[test]
fn test_gallog_listing_rows_and_paging() {
    let rows = parse_listing_rows(GALLOG_LISTING, ListingMode::Gallog, BASE);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1].written_at.unwrap(),
        kst().with_ymd_and_hms(2025, 5, 27, 0, 0, 0).unwrap()
    );

    let links = parse_pagination(GALLOG_LISTING, ListingMode::Gallog, BASE);
    assert_eq!(links.pages.len(), 1);
    assert!(links.next_block.is_none());
}

const VIEW_PAGE: &str = r##"<html><body>
<form id="_view_form_" name="_view_form_">
  <input type="hidden" id="no" name="no" value="88012">
  <input type="hidden" id="e_s_n_o" name="e_s_n_o" value="afe19c33bd001e">
</form>
<header>
  <span class="title_headtext">[질문]</span>
  <span class="title_subject">tokio 질문 있습니다</span>
  <div class="gall_writer ub-writer" data-nick="러붕이" data-uid="" data-ip="118.235">
    <span class="nickname">러붕이</span>
  </div>
  <span class="gall_date" title="2025-06-03 22:10:05">06.03 22:10</span>
</header>
<div class="write_div">
  <p>select! 매크로에서&nbsp;브랜치가 <b>안 타는</b> 경우가 있나요?</p>
  <p><br>코드는 아래와 같습니다</p>
</div>
<p id="recommend_view_up_88012">7</p>
<span class="gall_comment"><a href="#comment">댓글 3</a></span>
</body></html>"##;

#[test]
fn test_view_page_detail() {
    let detail = parse_post_detail(VIEW_PAGE).unwrap();

    assert_eq!(detail.post_no, 88012);
    assert_eq!(detail.esno, "afe19c33bd001e");
    assert_eq!(detail.title, "tokio 질문 있습니다");
    assert!(detail.contents.starts_with("select! 매크로에서 브랜치가 안 타는"));
    assert_eq!(detail.writer.as_deref(), Some("러붕이"));
    assert_eq!(detail.writer_id, None);
    assert_eq!(detail.writer_ip.as_deref(), Some("118.235"));
    assert_eq!(
        detail.written_at,
        kst().with_ymd_and_hms(2025, 6, 3, 22, 10, 5).unwrap()
    );
    assert_eq!(detail.like_cnt, 7);
    assert_eq!(detail.dislike_cnt, None);
    assert_eq!(detail.comment_cnt, 3);
}

#[test]
fn test_comment_html_to_plain_text() {
    let memo = r#"동의합니다 <br>저도 <b>같은 문제</b> 겪었어요 &amp; 해결했습니다"#;
    assert_eq!(
        strip_html(memo),
        "동의합니다\n저도 같은 문제 겪었어요 & 해결했습니다"
    );
}

#[test]
fn test_short_comment_date_year_patch() {
    // a run during 2025 observing "09.01 12:34:56"
    let dt = parse_comment_datetime_in("09.01 12:34:56", 2025).unwrap();
    assert_eq!(dt.to_rfc3339(), "2025-09-01T12:34:56+09:00");
}
