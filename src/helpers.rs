//! Helper functions for naming and parsing
//!
//! - Series / chapter identifier sanitising
//! - Page filename derivation
//! - Expected page count parsing
//!
//! # Examples
//!
//! ```
//! use manga_bridge::helpers::{page_filename, sanitize_series};
//!
//! assert_eq!(page_filename(7), "Page_007");
//! assert_eq!(sanitize_series("One Piece!"), "One_Piece_");
//! ```

use crate::models::ChapterIdentity;
use regex::Regex;
use std::sync::OnceLock;

/// Replace everything except ASCII letters and digits with `_`
pub fn sanitize_series(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Like `sanitize_series` but hyphens survive
pub fn sanitize_chapter(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Filename for the page at `index`, zero padded to three digits
pub fn page_filename(index: usize) -> String {
    format!("Page_{:03}", index)
}

/// Parse the page-count indicator text.
///
/// Leading digits win, trailing text is ignored ("20 pages" -> 20).
/// Anything without leading digits means there is no usable count.
pub fn parse_expected_count(text: &str) -> Option<usize> {
    static LEADING_DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_DIGITS.get_or_init(|| Regex::new(r"^\+?(\d+)").expect("static regex"));
    re.captures(text.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Final non-empty-or-not path segment of a URL, the way a browser's
/// `location.pathname.split('/').pop()` sees it.
pub fn last_path_segment(url: &str) -> Option<String> {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Build series/chapter identifiers from what the page offers.
///
/// Series comes from the breadcrumb, chapter from the URL. Both fall back to
/// the document title.
pub fn chapter_identity(breadcrumb: Option<&str>, location: &str, title: &str) -> ChapterIdentity {
    let series_source = breadcrumb
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| title.trim());
    let chapter_source = last_path_segment(location).unwrap_or_else(|| title.to_string());

    ChapterIdentity {
        series: sanitize_series(series_source),
        chapter: sanitize_chapter(&chapter_source),
    }
}
