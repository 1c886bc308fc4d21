//! Checks the discovered pages against the page count the reader declares.

use crate::discovery::{discover, ImagePattern};
use crate::document::Document;
use crate::error::BridgeError;
use crate::helpers::parse_expected_count;
use crate::models::PageSet;
use crate::scroll::{force_scroll, ScrollPolicy};

/// A page set that passed the integrity check
#[derive(Debug, Clone)]
pub struct VerifiedPages {
    pub pages: PageSet,
    /// Declared count, if the page had a readable indicator
    pub expected: Option<usize>,
    /// Whether the forced-scroll pass ran
    pub remediated: bool,
}

/// Read the declared page count; a missing or unparsable indicator means
/// there is nothing to check against.
pub fn expected_count<D: Document + ?Sized>(doc: &D, selector: &str) -> Option<usize> {
    match doc.text(selector) {
        Ok(Some(text)) => parse_expected_count(&text),
        Ok(None) => None,
        Err(e) => {
            log::warn!("Could not read page count indicator `{}`: {}", selector, e);
            None
        }
    }
}

/// Discover the chapter's pages and make sure none are missing.
///
/// With a declared count and a short scan, force-scroll once and rescan. A
/// rescan that is still short is an integrity failure. An empty result is
/// `NoContent` whether or not a count was declared.
pub async fn verify_pages<D: Document + ?Sized>(
    doc: &D,
    pattern: &ImagePattern,
    count_selector: &str,
    scroll: &ScrollPolicy,
) -> Result<VerifiedPages, BridgeError> {
    let mut pages = discover(doc, pattern)?;
    let expected = expected_count(doc, count_selector);
    let mut remediated = false;

    if let Some(expected) = expected {
        if pages.len() < expected {
            log::warn!(
                "Found {}/{} pages, forcing a scroll to trigger lazy loads",
                pages.len(),
                expected
            );
            force_scroll(doc, scroll).await?;
            pages = discover(doc, pattern)?;
            remediated = true;

            if pages.len() < expected {
                return Err(BridgeError::Integrity {
                    found: pages.len(),
                    expected,
                });
            }
        }
    }

    if pages.is_empty() {
        return Err(BridgeError::NoContent);
    }

    log::info!(
        "Verified {} pages (declared: {})",
        pages.len(),
        expected.map_or_else(|| "none".to_string(), |n| n.to_string())
    );

    Ok(VerifiedPages {
        pages,
        expected,
        remediated,
    })
}
