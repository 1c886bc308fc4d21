//! The live reader page, as the pipeline sees it.
//!
//! Everything the pipeline needs from the host browser goes through
//! [`Document`]: reading image elements, nudging the viewport, reading a few
//! bits of text and clicking the next-chapter control. The Chrome-backed
//! implementation lives in [`crate::browser::ChromeDocument`]; tests drive the
//! pipeline with scripted in-memory documents.

use crate::browser::BrowserError;
use crate::models::{ElementId, PageElement, Viewport};
use std::fmt;
use std::time::Duration;

/// One way of finding the next-chapter control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextControl {
    /// First element matching a CSS selector
    Selector(String),
    /// First link whose own text contains the marker
    LinkText(String),
}

impl fmt::Display for NextControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextControl::Selector(sel) => write!(f, "selector `{}`", sel),
            NextControl::LinkText(text) => write!(f, "link text `{}`", text),
        }
    }
}

pub trait Document {
    /// Every `<img>` in document order
    fn images(&self) -> Result<Vec<PageElement>, BrowserError>;

    /// Fresh read of one element; `None` once it left the document
    fn image(&self, id: ElementId) -> Result<Option<PageElement>, BrowserError>;

    fn scroll_into_view(&self, id: ElementId) -> Result<(), BrowserError>;

    fn scroll_to_top(&self) -> Result<(), BrowserError>;

    fn scroll_by(&self, dy: i64) -> Result<(), BrowserError>;

    fn viewport(&self) -> Result<Viewport, BrowserError>;

    /// Trimmed text of the first element matching `selector`
    fn text(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    fn title(&self) -> Result<String, BrowserError>;

    fn location(&self) -> Result<String, BrowserError>;

    /// Click the first element `control` matches. `Ok(false)` when nothing
    /// matched.
    fn activate(&self, control: &NextControl) -> Result<bool, BrowserError>;

    /// Block until the document at `from` has been replaced by a loaded one
    fn wait_for_navigation(&self, from: &str, timeout: Duration) -> Result<(), BrowserError>;
}
