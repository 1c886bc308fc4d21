//! Waits for a lazily loaded page image to hold real content.
//!
//! Reader sites swap a short spinner or placeholder in first and the real page
//! later. An element counts as ready once the browser reports it complete and
//! it is taller than a placeholder would be.

use crate::document::Document;
use crate::models::{ElementId, PageElement};
use std::time::Duration;
use tokio::time::sleep;

/// Polling parameters for the readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub min_height: u32,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl ReadinessPolicy {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            min_height: config.min_height,
            interval: config.readiness_interval(),
            max_attempts: config.readiness_attempts,
        }
    }

    pub fn is_ready(&self, element: &PageElement) -> bool {
        element.complete && element.natural_height > self.min_height
    }
}

/// Poll until the element is ready or the attempts run out.
///
/// Checks once immediately, then up to `max_attempts` more times at
/// `interval`. Returns `false` on exhaustion; a read error or a detached
/// element counts as not ready for that poll.
pub async fn wait_until_ready<D: Document + ?Sized>(
    doc: &D,
    id: ElementId,
    policy: &ReadinessPolicy,
) -> bool {
    if check(doc, id, policy) {
        return true;
    }

    for attempt in 1..=policy.max_attempts {
        sleep(policy.interval).await;
        if check(doc, id, policy) {
            log::debug!("Image {} ready after {} polls", id, attempt);
            return true;
        }
    }

    false
}

fn check<D: Document + ?Sized>(doc: &D, id: ElementId, policy: &ReadinessPolicy) -> bool {
    match doc.image(id) {
        Ok(Some(element)) => policy.is_ready(&element),
        Ok(None) => false,
        Err(e) => {
            log::debug!("Readiness read failed for {}: {}", id, e);
            false
        }
    }
}
