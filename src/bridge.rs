//! Runs the page-ingestion loop across chapters.
//!
//! Per chapter: liveness check, discovery plus integrity check, ordered
//! transfer, then a click on the next-chapter control. Every fatal condition
//! goes through [`Bridge::abort`], which clears the activation flag and
//! raises an alert, so nothing keeps retrying in the background.

use crate::advance::{advance as click_next, next_control_chain};
use crate::config::Config;
use crate::discovery::ImagePattern;
use crate::document::{Document, NextControl};
use crate::error::BridgeError;
use crate::helpers::chapter_identity;
use crate::http_client::{ImageFetcher, PageStore};
use crate::integrity::verify_pages;
use crate::models::{ChapterIdentity, RunState};
use crate::scroll::ScrollPolicy;
use crate::session::ActivationFlag;
use crate::status::StatusReporter;
use crate::transfer::{TransferPipeline, TransferPolicy, TransferReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::Cell;
use tokio::time::sleep;

/// Outcome of one chapter
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    pub identity: ChapterIdentity,
    pub expected: Option<usize>,
    pub remediated: bool,
    pub transfer: TransferReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ChapterReport {
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} / {}: sent {}/{} pages",
            self.identity.series,
            self.identity.chapter,
            self.transfer.sent.len(),
            self.transfer.total
        );
        if !self.transfer.skipped.is_empty() {
            line.push_str(&format!(", skipped {:?}", self.transfer.skipped));
        }
        if let Some(index) = self.transfer.stopped_at {
            line.push_str(&format!(", stopped before page {}", index));
        }
        line.push_str(&format!(
            " in {}s",
            (self.finished_at - self.started_at).num_seconds()
        ));
        line
    }
}

pub struct Bridge<'a, D: Document + ?Sized, C> {
    doc: &'a D,
    client: &'a C,
    activation: &'a dyn ActivationFlag,
    reporter: &'a dyn StatusReporter,
    config: Config,
    pattern: ImagePattern,
    next_chain: Vec<NextControl>,
    state: Cell<RunState>,
}

impl<'a, D, C> Bridge<'a, D, C>
where
    D: Document + ?Sized,
    C: ImageFetcher + PageStore,
{
    pub fn new(
        doc: &'a D,
        client: &'a C,
        activation: &'a dyn ActivationFlag,
        reporter: &'a dyn StatusReporter,
        config: Config,
    ) -> Result<Self, BridgeError> {
        let pattern = ImagePattern::new(&config.image_pattern)?;
        let next_chain = next_control_chain(&config.next_selectors, &config.next_markers);

        Ok(Self {
            doc,
            client,
            activation,
            reporter,
            config,
            pattern,
            next_chain,
            state: Cell::new(RunState::Idle),
        })
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Liveness gate. Sets the activation flag only when the page store
    /// answers.
    pub async fn start(&self) -> Result<(), BridgeError> {
        self.reporter.status("Connecting...");

        if !self.client.ping().await {
            return Err(self.abort(BridgeError::ServerUnreachable {
                url: self.config.server_url.clone(),
            }));
        }

        self.activation.set_active(true)?;
        self.reporter.status("Bridge running");
        Ok(())
    }

    /// Gate for every chapter after the first. Waits out the resume delay,
    /// re-checks liveness and reports whether the run is still switched on.
    /// Never sets the flag: a stop issued meanwhile must stick.
    async fn resume(&self) -> Result<bool, BridgeError> {
        if !self.activation.is_active() {
            return Ok(false);
        }
        sleep(self.config.resume_delay()).await;

        if !self.client.ping().await {
            return Err(self.abort(BridgeError::ServerUnreachable {
                url: self.config.server_url.clone(),
            }));
        }
        Ok(self.activation.is_active())
    }

    /// Verify and transfer the chapter currently loaded. Does not advance.
    pub async fn run_chapter(&self) -> Result<ChapterReport, BridgeError> {
        let started_at = Utc::now();
        self.state.set(RunState::Verifying);
        self.reporter.status("Smart syncing...");

        if let Err(e) = self.doc.scroll_to_top() {
            log::debug!("scrollTo(0, 0) failed: {}", e);
        }

        let verified = match verify_pages(
            self.doc,
            &self.pattern,
            &self.config.expected_count_selector,
            &ScrollPolicy::from_config(&self.config),
        )
        .await
        {
            Ok(verified) => verified,
            Err(e) => {
                self.state.set(RunState::Idle);
                if matches!(e, BridgeError::Integrity { .. }) {
                    self.reporter.status("Missing pages");
                }
                return Err(e);
            }
        };

        let identity = self.identity()?;
        log::info!(
            "Transferring {} pages of {} / {}",
            verified.pages.len(),
            identity.series,
            identity.chapter
        );

        let pipeline = TransferPipeline {
            doc: self.doc,
            client: self.client,
            activation: self.activation,
            reporter: self.reporter,
            policy: TransferPolicy::from_config(&self.config),
            state: &self.state,
        };
        let transfer = pipeline.run(&verified.pages, &identity).await;
        self.state.set(RunState::Idle);

        let report = ChapterReport {
            identity,
            expected: verified.expected,
            remediated: verified.remediated,
            transfer,
            started_at,
            finished_at: Utc::now(),
        };
        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Click through to the next chapter and wait until it has loaded
    pub async fn advance(&self) -> Result<(), BridgeError> {
        self.state.set(RunState::Advancing);
        self.reporter.status("Next chapter...");
        sleep(self.config.advance_delay()).await;

        let from = self.doc.location()?;
        let result = match click_next(self.doc, &self.next_chain) {
            Ok(_) => self
                .doc
                .wait_for_navigation(&from, self.config.navigation_timeout())
                .map_err(BridgeError::from),
            Err(e) => Err(e),
        };

        self.state.set(RunState::Idle);
        result
    }

    /// Start, then process chapters until deactivated, out of chapters to
    /// allow, or a fatal error.
    pub async fn run(&self) -> Result<Vec<ChapterReport>, BridgeError> {
        let mut reports: Vec<ChapterReport> = Vec::new();

        loop {
            if reports.is_empty() {
                self.start().await?;
            } else if !self.resume().await? {
                log::info!("Activation cleared, not starting next chapter");
                break;
            }

            let report = self.run_chapter().await.map_err(|e| self.abort(e))?;
            let stopped = report.transfer.is_stopped();
            reports.push(report);

            if stopped {
                break;
            }
            if let Some(max) = self.config.max_chapters {
                if reports.len() >= max {
                    log::info!("Processed {} chapters, stopping", reports.len());
                    break;
                }
            }

            self.advance().await.map_err(|e| self.abort(e))?;
        }

        self.state.set(RunState::Idle);
        Ok(reports)
    }

    fn identity(&self) -> Result<ChapterIdentity, BridgeError> {
        let breadcrumb = match self.doc.text(&self.config.breadcrumb_selector) {
            Ok(text) => text,
            Err(e) => {
                log::debug!("Breadcrumb lookup failed: {}", e);
                None
            }
        };
        let location = self.doc.location()?;
        let title = self.doc.title().unwrap_or_default();
        Ok(chapter_identity(breadcrumb.as_deref(), &location, &title))
    }

    /// Shared recovery for every fatal condition: deactivate, tell the
    /// operator, hand the error back.
    fn abort(&self, err: BridgeError) -> BridgeError {
        self.state.set(RunState::Idle);
        if let Err(e) = self.activation.set_active(false) {
            log::error!("Could not clear activation flag: {}", e);
        }
        log::error!("Run aborted: {}", err);
        if err.is_operator_alert() {
            self.reporter.alert(&err.to_string());
        } else {
            self.reporter.alert(&format!("bridge stopped: {}", err));
        }
        err
    }
}
