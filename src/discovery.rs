//! Finds the chapter's page images among everything on the page.

use crate::browser::BrowserError;
use crate::document::Document;
use crate::error::BridgeError;
use crate::models::{PageElement, PageSet};
use regex::Regex;

/// Locator pattern that marks an image as a storage-backed page rather than
/// site chrome (logos, avatars, icons)
#[derive(Debug, Clone)]
pub struct ImagePattern(Regex);

impl ImagePattern {
    pub fn new(pattern: &str) -> Result<Self, BridgeError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| BridgeError::Config(format!("image_pattern `{}`: {}", pattern, e)))
    }

    /// True when the primary or any lazy locator matches
    pub fn matches(&self, element: &PageElement) -> bool {
        element
            .src
            .as_deref()
            .into_iter()
            .chain(element.lazy_sources())
            .any(|locator| !locator.is_empty() && self.0.is_match(locator))
    }
}

/// Build the page set from the document as it is right now.
///
/// Read-only and repeatable: calling it twice on an unchanged document gives
/// the same set.
pub fn discover<D: Document + ?Sized>(doc: &D, pattern: &ImagePattern) -> Result<PageSet, BrowserError> {
    let images = doc.images()?;
    let total = images.len();
    let pages: Vec<PageElement> = images.into_iter().filter(|img| pattern.matches(img)).collect();

    log::debug!("Discovered {} page images among {} <img> elements", pages.len(), total);
    Ok(PageSet::new(pages))
}
