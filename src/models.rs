use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to one `<img>` in the live document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of an image element as last read from the document.
///
/// The element itself lives in the host document; this is only what we saw
/// the last time we asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElement {
    pub id: ElementId,
    /// Resolved `src` (empty attribute reads as `None`)
    #[serde(default)]
    pub src: Option<String>,
    /// `data-src`
    #[serde(default)]
    pub data_src: Option<String>,
    /// `data-lazy-src`
    #[serde(default)]
    pub data_lazy_src: Option<String>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub natural_height: u32,
}

impl PageElement {
    /// Lazy-source locators in priority order
    pub fn lazy_sources(&self) -> impl Iterator<Item = &str> {
        [self.data_src.as_deref(), self.data_lazy_src.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
    }

    /// The locator a transfer should use: lazy sources win over `src`,
    /// which may still point at a placeholder.
    pub fn preferred_source(&self) -> Option<&str> {
        self.lazy_sources().next().or_else(|| {
            self.src
                .as_deref()
                .filter(|s| !s.trim().is_empty())
        })
    }
}

/// Ordered page images for one chapter, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet {
    pages: Vec<PageElement>,
}

impl PageSet {
    pub fn new(pages: Vec<PageElement>) -> Self {
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageElement> {
        self.pages.iter()
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.pages.iter().map(|p| p.id).collect()
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a PageElement;
    type IntoIter = std::slice::Iter<'a, PageElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Scroll geometry of the viewport
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub scroll_y: f64,
    pub inner_height: f64,
    pub document_height: f64,
}

impl Viewport {
    /// Bottom edge of the viewport in document coordinates
    pub fn bottom(&self) -> f64 {
        self.inner_height + self.scroll_y
    }
}

/// Series and chapter names as sent to the page store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterIdentity {
    pub series: String,
    pub chapter: String,
}

/// One page ready to send. Built whole, sent whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferUnit {
    #[serde(rename = "manga")]
    pub series: String,
    pub chapter: String,
    pub filename: String,
    pub image_data: String,
}

impl TransferUnit {
    pub fn new(identity: &ChapterIdentity, filename: String, image_data: String) -> Self {
        Self {
            series: identity.series.clone(),
            chapter: identity.chapter.clone(),
            filename,
            image_data,
        }
    }
}

/// Where the bridge is within a run. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Verifying,
    Transferring { index: usize },
    Advancing,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Verifying => write!(f, "verifying"),
            RunState::Transferring { index } => write!(f, "transferring page {}", index),
            RunState::Advancing => write!(f, "advancing"),
        }
    }
}
