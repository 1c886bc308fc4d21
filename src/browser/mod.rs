//! Headless Chrome host for the reader page
//!
//! The bridge runs where a user would: inside a real browser tab with the
//! reader's own lazy loader, cookies and scroll handling. This module launches
//! Chrome and exposes the tab as a [`crate::document::Document`].
//!
//! # Example
//!
//! ```no_run
//! use manga_bridge::browser::{BrowserConfig, BrowserManager, ChromeDocument};
//! use manga_bridge::document::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BrowserManager::new(BrowserConfig::default())?;
//! let doc = ChromeDocument::new(manager.new_tab()?, manager.config().timeout());
//!
//! doc.navigate("https://reader.example/read/some-title/chapter-1")?;
//! println!("{} images on the page", doc.images()?.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod manager;

// Re-export main types for convenience
pub use config::BrowserConfig;
pub use document::ChromeDocument;
pub use manager::{BrowserError, BrowserManager};
