//! Moves a verified page set to the page store, one page at a time.
//!
//! Pages go strictly in page-set order and never overlap, so the store sees
//! `Page_000`, `Page_001`, ... in reading order. A failed page gets exactly
//! one more try after a backoff; if that fails too it is dropped and the loop
//! carries on with the next index.

use crate::document::Document;
use crate::encode::to_data_url;
use crate::error::TransferError;
use crate::helpers::page_filename;
use crate::http_client::{ImageFetcher, PageStore};
use crate::models::{ChapterIdentity, PageElement, PageSet, RunState, TransferUnit};
use crate::readiness::{wait_until_ready, ReadinessPolicy};
use crate::session::ActivationFlag;
use crate::status::StatusReporter;
use reqwest::Url;
use serde::Serialize;
use std::cell::Cell;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy)]
pub struct TransferPolicy {
    pub readiness: ReadinessPolicy,
    pub retry_backoff: Duration,
}

impl TransferPolicy {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            readiness: ReadinessPolicy::from_config(config),
            retry_backoff: config.retry_backoff(),
        }
    }
}

/// What happened to each page of one chapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub total: usize,
    /// Indices delivered, in order
    pub sent: Vec<usize>,
    /// Indices dropped after the retry also failed. Informational only;
    /// nothing re-attempts them.
    pub skipped: Vec<usize>,
    /// Set when deactivation stopped the loop before this index
    pub stopped_at: Option<usize>,
}

impl TransferReport {
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }
}

/// Resolve the locator a transfer should fetch, absolute against `base`
pub fn resolve_source(element: &PageElement, base: Option<&Url>) -> Option<String> {
    let raw = element.preferred_source()?.trim();
    let resolved = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    resolved.ok().map(String::from)
}

/// Everything the per-page loop touches, borrowed for one chapter
pub struct TransferPipeline<'a, D: Document + ?Sized, C> {
    pub doc: &'a D,
    pub client: &'a C,
    pub activation: &'a dyn ActivationFlag,
    pub reporter: &'a dyn StatusReporter,
    pub policy: TransferPolicy,
    pub state: &'a Cell<RunState>,
}

impl<'a, D, C> TransferPipeline<'a, D, C>
where
    D: Document + ?Sized,
    C: ImageFetcher + PageStore,
{
    pub async fn run(&self, pages: &PageSet, identity: &ChapterIdentity) -> TransferReport {
        let total = pages.len();
        let mut report = TransferReport {
            total,
            ..Default::default()
        };

        let referer = self.doc.location().ok();
        let base = referer.as_deref().and_then(|r| Url::parse(r).ok());

        for (index, page) in pages.iter().enumerate() {
            if !self.activation.is_active() {
                log::info!("Deactivated, stopping before page {}/{}", index + 1, total);
                report.stopped_at = Some(index);
                break;
            }

            self.state.set(RunState::Transferring { index });
            self.reporter.status(&format!("Sending {}/{}...", index + 1, total));

            if let Err(e) = self.doc.scroll_into_view(page.id) {
                log::debug!("scrollIntoView failed for page {}: {}", index, e);
            }

            if !wait_until_ready(self.doc, page.id, &self.policy.readiness).await {
                log::warn!("Timeout waiting for image {}", index);
            }

            let filename = page_filename(index);
            let ctx = Attempt {
                page,
                base: base.as_ref(),
                referer: referer.as_deref(),
                identity,
                filename: &filename,
            };

            match self.attempt(&ctx).await {
                Ok(()) => {
                    log::info!("Sent {} ({}/{})", filename, index + 1, total);
                    report.sent.push(index);
                }
                Err(e) => {
                    log::warn!(
                        "Failed page {}: {}. Retrying in {:?}",
                        index,
                        e,
                        self.policy.retry_backoff
                    );
                    self.reporter.status(&format!("Retrying {}/{}...", index + 1, total));
                    sleep(self.policy.retry_backoff).await;

                    match self.attempt(&ctx).await {
                        Ok(()) => {
                            log::info!("Retry succeeded for {}", filename);
                            report.sent.push(index);
                        }
                        Err(e) => {
                            log::error!("Retry failed for {}, skipping: {}", filename, e);
                            report.skipped.push(index);
                        }
                    }
                }
            }
        }

        report
    }

    /// One fetch-encode-send pass. The locator is re-read from the live
    /// element each time, falling back to the discovery snapshot.
    async fn attempt(&self, ctx: &Attempt<'_>) -> Result<(), TransferError> {
        let current = match self.doc.image(ctx.page.id) {
            Ok(current) => current,
            Err(e) => {
                log::debug!("Could not re-read page element {}: {}", ctx.page.id, e);
                None
            }
        };
        let element = current.as_ref().unwrap_or(ctx.page);
        let url = resolve_source(element, ctx.base).ok_or(TransferError::MissingSource)?;

        let image = self.client.fetch_image(&url, ctx.referer).await?;
        let payload = to_data_url(image.content_type.as_deref(), &image.bytes);
        let unit = TransferUnit::new(ctx.identity, ctx.filename.to_string(), payload);

        self.client.save_page(&unit).await
    }
}

struct Attempt<'a> {
    page: &'a PageElement,
    base: Option<&'a Url>,
    referer: Option<&'a str>,
    identity: &'a ChapterIdentity,
    filename: &'a str,
}
