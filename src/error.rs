//! Error types for the bridge
//!
//! Two layers:
//! - `TransferError`: a single page failed to reach the page store. Always
//!   recoverable, the pipeline retries once and then skips the page.
//! - `BridgeError`: something that ends the current run (or prevents it from
//!   starting). The run-fatal variants clear the activation flag and raise an
//!   operator alert.

use crate::browser::BrowserError;

/// Failure while moving one page from the image host to the page store
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("page element has no usable source locator")]
    MissingSource,

    #[error("image request failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image host returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("page store request failed: {0}")]
    Save(#[source] reqwest::Error),

    #[error("page store rejected page with status {status}")]
    Rejected { status: u16 },
}

/// Conditions that stop a run
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("persistence server not running at {url}")]
    ServerUnreachable { url: String },

    #[error("integrity failure: found {found}/{expected} pages")]
    Integrity { found: usize, expected: usize },

    #[error("no page images found")]
    NoContent,

    #[error("next chapter control not found")]
    NavigationNotFound,

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("activation state error: {0}")]
    State(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether this error is one of the run-ending conditions the operator
    /// must be told about.
    pub fn is_operator_alert(&self) -> bool {
        matches!(
            self,
            BridgeError::ServerUnreachable { .. }
                | BridgeError::Integrity { .. }
                | BridgeError::NoContent
                | BridgeError::NavigationNotFound
        )
    }
}
