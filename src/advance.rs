//! Finds and clicks the reader's "next chapter" control.
//!
//! Matchers are tried in order and the first one that finds something wins:
//! the explicitly labelled control, then known navigation selectors, then
//! links whose text looks like "next".

use crate::document::{Document, NextControl};
use crate::error::BridgeError;

/// The explicitly labelled next-chapter link
pub const LABELLED_NEXT: &str = r#"a[title="Next Chapter"]"#;

/// Full matcher chain in priority order
pub fn next_control_chain(selectors: &[String], markers: &[String]) -> Vec<NextControl> {
    std::iter::once(NextControl::Selector(LABELLED_NEXT.to_string()))
        .chain(selectors.iter().cloned().map(NextControl::Selector))
        .chain(markers.iter().cloned().map(NextControl::LinkText))
        .collect()
}

/// Activate the first control any matcher finds.
///
/// A matcher that errors (bad selector, script failure) is logged and
/// skipped. Nothing matching at all is `NavigationNotFound`.
pub fn advance<D: Document + ?Sized>(doc: &D, chain: &[NextControl]) -> Result<NextControl, BridgeError> {
    for control in chain {
        match doc.activate(control) {
            Ok(true) => {
                log::info!("Activated next chapter via {}", control);
                return Ok(control.clone());
            }
            Ok(false) => log::debug!("No match for {}", control),
            Err(e) => log::warn!("Next-chapter matcher {} failed: {}", control, e),
        }
    }

    Err(BridgeError::NavigationNotFound)
}
