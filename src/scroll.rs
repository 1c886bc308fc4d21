//! Forced scroll: walk the viewport to the end of the document so every
//! deferred image gets its chance to load.

use crate::browser::BrowserError;
use crate::document::Document;
use crate::models::Viewport;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPolicy {
    pub step: i64,
    pub interval: Duration,
    pub tolerance: f64,
}

impl ScrollPolicy {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            step: config.scroll_step,
            interval: config.scroll_interval(),
            tolerance: config.scroll_tolerance,
        }
    }
}

/// Convergence check fed one viewport reading per tick.
///
/// Done once the viewport bottom is within tolerance of the document end and
/// the scroll offset did not move since the previous tick.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    last_scroll_y: Option<f64>,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick; returns true when scrolling has converged
    pub fn observe(&mut self, viewport: &Viewport, tolerance: f64) -> bool {
        let at_end = viewport.bottom() >= viewport.document_height - tolerance;
        let stalled = self.last_scroll_y == Some(viewport.scroll_y);
        self.last_scroll_y = Some(viewport.scroll_y);
        at_end && stalled
    }
}

/// Scroll by `policy.step` every `policy.interval` until the tracker
/// converges. Returns the number of ticks taken.
///
/// There is no tick cap: a document that keeps growing forever keeps this
/// running.
pub async fn force_scroll<D: Document + ?Sized>(doc: &D, policy: &ScrollPolicy) -> Result<usize, BrowserError> {
    let mut tracker = ScrollTracker::new();
    let mut ticks = 0usize;

    loop {
        sleep(policy.interval).await;
        doc.scroll_by(policy.step)?;
        ticks += 1;

        let viewport = doc.viewport()?;
        if tracker.observe(&viewport, policy.tolerance) {
            log::info!(
                "Forced scroll settled after {} ticks at {:.0}/{:.0}px",
                ticks,
                viewport.bottom(),
                viewport.document_height
            );
            return Ok(ticks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(scroll_y: f64, document_height: f64) -> Viewport {
        Viewport {
            scroll_y,
            inner_height: 1000.0,
            document_height,
        }
    }

    #[test]
    fn test_needs_two_readings_at_bottom() {
        let mut tracker = ScrollTracker::new();
        assert!(!tracker.observe(&vp(3000.0, 4000.0), 50.0));
        assert!(tracker.observe(&vp(3000.0, 4000.0), 50.0));
    }

    #[test]
    fn test_stall_away_from_bottom_keeps_going() {
        let mut tracker = ScrollTracker::new();
        assert!(!tracker.observe(&vp(1000.0, 4000.0), 50.0));
        assert!(!tracker.observe(&vp(1000.0, 4000.0), 50.0));
    }

    #[test]
    fn test_tolerance_counts_as_bottom() {
        let mut tracker = ScrollTracker::new();
        tracker.observe(&vp(2960.0, 4000.0), 50.0);
        assert!(tracker.observe(&vp(2960.0, 4000.0), 50.0));

        let mut strict = ScrollTracker::new();
        strict.observe(&vp(2940.0, 4000.0), 50.0);
        assert!(!strict.observe(&vp(2940.0, 4000.0), 50.0));
    }

    #[test]
    fn test_growing_document_resets_convergence() {
        let mut tracker = ScrollTracker::new();
        assert!(!tracker.observe(&vp(3000.0, 4000.0), 50.0));
        // lazy content appended; position moved on next tick
        assert!(!tracker.observe(&vp(4000.0, 6000.0), 50.0));
        assert!(!tracker.observe(&vp(5000.0, 6000.0), 50.0));
        assert!(tracker.observe(&vp(5000.0, 6000.0), 50.0));
    }
}
