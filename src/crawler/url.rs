//! Gallery URL codec
//!
//! Maps between post view URLs and stable platform IDs of the form
//! `DC&<gallType>&<galleryId>&<postNo>`. The gallery type comes from the
//! path prefix, the gallery id and post number from the query string. The
//! mapping is bijective under the canonical `gall.dcinside.com` host.

use url::Url;

use crate::config::DEFAULT_HOST;
use crate::error::ParseError;
use crate::models::{GalleryType, PostKey};

/// Structured gallery info extracted from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryInfo {
    pub gall_type: GalleryType,
    pub gallery_id: String,
    /// Absent on listing URLs
    pub post_no: Option<u64>,
}

/// Extract gallery type, id, and post number from any gallery URL
///
/// # Errors
///
/// `ParseError::InvalidUrl` when the URL does not parse, the path matches no
/// known board prefix, or the mandatory `id` parameter is missing.
pub fn extract_gallery_info(url: &str) -> Result<GalleryInfo, ParseError> {
    let parsed = Url::parse(url).map_err(|_| ParseError::InvalidUrl(url.to_string()))?;
    let path = parsed.path();

    // /mgallery/ paths also contain /board/, so the narrower prefixes win
    let gall_type = if path.starts_with("/mgallery/") {
        GalleryType::Minor
    } else if path.starts_with("/mini/") {
        GalleryType::Mini
    } else if path.starts_with("/board/") {
        GalleryType::General
    } else {
        return Err(ParseError::InvalidUrl(url.to_string()));
    };

    let mut gallery_id = None;
    let mut post_no = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "id" if !value.is_empty() => gallery_id = Some(value.into_owned()),
            "no" => post_no = value.parse::<u64>().ok(),
            _ => {}
        }
    }

    let gallery_id = gallery_id.ok_or_else(|| ParseError::InvalidUrl(url.to_string()))?;

    Ok(GalleryInfo {
        gall_type,
        gallery_id,
        post_no,
    })
}

/// Decode a post view URL into its platform key
pub fn url_to_post_key(url: &str) -> Result<PostKey, ParseError> {
    let info = extract_gallery_info(url)?;
    let post_no = info
        .post_no
        .ok_or_else(|| ParseError::InvalidUrl(url.to_string()))?;
    Ok(PostKey::new(info.gall_type, info.gallery_id, post_no))
}

/// Decode a post view URL into its canonical platform ID string
pub fn url_to_platform_id(url: &str) -> Result<String, ParseError> {
    Ok(url_to_post_key(url)?.platform_id())
}

/// Canonical view URL for a platform key
pub fn post_key_to_url(key: &PostKey) -> String {
    format!(
        "{DEFAULT_HOST}{}?id={}&no={}",
        key.gall_type.view_path(),
        key.gallery_id,
        key.post_no
    )
}

/// Canonical view URL for a platform ID string
pub fn platform_id_to_url(platform_id: &str) -> Result<String, ParseError> {
    let key: PostKey = platform_id.parse()?;
    Ok(post_key_to_url(&key))
}

/// Resolve a possibly relative href against a base URL
pub fn to_absolute(href: &str, base: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    Url::parse(base).ok()?.join(href).ok().map(Into::into)
}
