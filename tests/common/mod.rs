//! Scripted reader page and page store for driving the pipeline without a
//! browser or a network.

#![allow(dead_code)]

use manga_bridge::browser::BrowserError;
use manga_bridge::config::Config;
use manga_bridge::document::{Document, NextControl};
use manga_bridge::error::TransferError;
use manga_bridge::http_client::{FetchedImage, ImageFetcher, PageStore};
use manga_bridge::models::{ElementId, PageElement, TransferUnit, Viewport};
use manga_bridge::session::{ActivationFlag, MemoryActivation};
use manga_bridge::status::StatusReporter;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

pub const PAGE_HEIGHT: f64 = 1000.0;
pub const INNER_HEIGHT: f64 = 900.0;
pub const FOOTER_HEIGHT: f64 = 500.0;

const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Defaults with every wait shrunk to milliseconds
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.readiness_interval_ms = 1;
    config.readiness_attempts = 3;
    config.scroll_interval_ms = 1;
    config.retry_backoff_ms = 1;
    config.advance_delay_ms = 1;
    config.resume_delay_ms = 1;
    config.navigation_timeout_secs = 1;
    config
}

/// One chapter page as the fake reader serves it
#[derive(Debug, Clone)]
pub struct Chapter {
    pub slug: String,
    pub series: Option<String>,
    pub title: String,
    pub total_pages: Option<String>,
    /// Pages present on load
    pub visible: usize,
    /// Pages appended once the viewport reaches the bottom
    pub deferred: usize,
    /// Control that leads to the following chapter, if any
    pub next: Option<NextControl>,
}

impl Chapter {
    pub fn new(slug: &str, pages: usize) -> Self {
        Self {
            slug: slug.to_string(),
            series: Some("Solo Leveling".to_string()),
            title: format!("Solo Leveling {}", slug),
            total_pages: Some(pages.to_string()),
            visible: pages,
            deferred: 0,
            next: Some(NextControl::Selector(
                r#"a[title="Next Chapter"]"#.to_string(),
            )),
        }
    }

    pub fn location(&self) -> String {
        format!("https://reader.example/read/solo-leveling/{}", self.slug)
    }

    pub fn page_url(&self, index: usize) -> String {
        format!("https://reader.example/storage/{}/{:02}.jpg", self.slug, index)
    }

    pub fn with_deferred(mut self, visible: usize, deferred: usize) -> Self {
        self.visible = visible;
        self.deferred = deferred;
        self
    }

    pub fn with_total(mut self, total: Option<&str>) -> Self {
        self.total_pages = total.map(String::from);
        self
    }

    pub fn with_next(mut self, next: Option<NextControl>) -> Self {
        self.next = next;
        self
    }
}

#[derive(Debug, Default)]
struct DocState {
    chapter: usize,
    images: Vec<PageElement>,
    deferred: Vec<PageElement>,
    scroll_y: f64,
    document_height: f64,
    /// Polls left before an element reports itself loaded
    loading: HashMap<ElementId, u32>,
    failing_controls: Vec<NextControl>,
    activations: Vec<NextControl>,
    scrolled_into_view: Vec<ElementId>,
    scroll_ticks: usize,
    images_broken: bool,
}

/// In-memory reader page walking through a list of chapters
pub struct FakeDocument {
    chapters: Vec<Chapter>,
    state: RefCell<DocState>,
}

impl FakeDocument {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        let doc = Self {
            chapters,
            state: RefCell::new(DocState::default()),
        };
        doc.load(0);
        doc
    }

    fn load(&self, index: usize) {
        let chapter = &self.chapters[index];
        let mut state = self.state.borrow_mut();
        let base = (index as u64 + 1) * 1000;

        let logo = PageElement {
            id: ElementId(base),
            src: Some("https://reader.example/assets/logo.png".to_string()),
            data_src: None,
            data_lazy_src: None,
            complete: true,
            natural_height: 64,
        };
        let page = |i: usize| PageElement {
            id: ElementId(base + 1 + i as u64),
            src: Some(chapter.page_url(i)),
            data_src: None,
            data_lazy_src: None,
            complete: true,
            natural_height: 1400,
        };

        state.chapter = index;
        state.images = std::iter::once(logo).chain((0..chapter.visible).map(page)).collect();
        state.deferred = (chapter.visible..chapter.visible + chapter.deferred)
            .map(page)
            .collect();
        state.scroll_y = 0.0;
        state.document_height = chapter.visible as f64 * PAGE_HEIGHT + FOOTER_HEIGHT;
    }

    fn current(&self) -> &Chapter {
        &self.chapters[self.state.borrow().chapter]
    }

    /// Element id of page `index` in the current chapter
    pub fn page_id(&self, index: usize) -> ElementId {
        ElementId((self.state.borrow().chapter as u64 + 1) * 1000 + 1 + index as u64)
    }

    /// Make page `index` report as still loading for `polls` reads
    pub fn loading_for(&self, index: usize, polls: u32) {
        let id = self.page_id(index);
        self.state.borrow_mut().loading.insert(id, polls);
    }

    /// Give page `index` a placeholder `src` and its real locator in `data-src`
    pub fn lazy_source(&self, index: usize, data_src: &str) {
        let id = self.page_id(index);
        let mut state = self.state.borrow_mut();
        if let Some(img) = state.images.iter_mut().find(|img| img.id == id) {
            img.src = Some("https://reader.example/spinner.gif".to_string());
            img.data_src = Some(data_src.to_string());
        }
    }

    /// Make every `images()` read fail, as a crashed tab would
    pub fn break_images(&self) {
        self.state.borrow_mut().images_broken = true;
    }

    pub fn fail_control(&self, control: NextControl) {
        self.state.borrow_mut().failing_controls.push(control);
    }

    pub fn chapter_index(&self) -> usize {
        self.state.borrow().chapter
    }

    pub fn activations(&self) -> Vec<NextControl> {
        self.state.borrow().activations.clone()
    }

    pub fn scrolled_into_view(&self) -> Vec<ElementId> {
        self.state.borrow().scrolled_into_view.clone()
    }

    pub fn scroll_ticks(&self) -> usize {
        self.state.borrow().scroll_ticks
    }

    fn reveal_at_bottom(state: &mut DocState) {
        let max_scroll = (state.document_height - INNER_HEIGHT).max(0.0);
        if state.scroll_y >= max_scroll && !state.deferred.is_empty() {
            let revealed = std::mem::take(&mut state.deferred);
            state.document_height += revealed.len() as f64 * PAGE_HEIGHT;
            state.images.extend(revealed);
        }
    }
}

impl Document for FakeDocument {
    fn images(&self) -> Result<Vec<PageElement>, BrowserError> {
        let state = self.state.borrow();
        if state.images_broken {
            return Err(BrowserError::JavaScriptError("tab crashed".to_string()));
        }
        Ok(state.images.clone())
    }

    fn image(&self, id: ElementId) -> Result<Option<PageElement>, BrowserError> {
        let mut state = self.state.borrow_mut();
        let Some(mut element) = state.images.iter().find(|img| img.id == id).cloned() else {
            return Ok(None);
        };
        if let Some(left) = state.loading.get_mut(&id) {
            if *left > 0 {
                *left -= 1;
                element.complete = false;
                element.natural_height = 0;
            }
        }
        Ok(Some(element))
    }

    fn scroll_into_view(&self, id: ElementId) -> Result<(), BrowserError> {
        self.state.borrow_mut().scrolled_into_view.push(id);
        Ok(())
    }

    fn scroll_to_top(&self) -> Result<(), BrowserError> {
        self.state.borrow_mut().scroll_y = 0.0;
        Ok(())
    }

    fn scroll_by(&self, dy: i64) -> Result<(), BrowserError> {
        let mut state = self.state.borrow_mut();
        let max_scroll = (state.document_height - INNER_HEIGHT).max(0.0);
        state.scroll_y = (state.scroll_y + dy as f64).clamp(0.0, max_scroll);
        state.scroll_ticks += 1;
        Self::reveal_at_bottom(&mut state);
        Ok(())
    }

    fn viewport(&self) -> Result<Viewport, BrowserError> {
        let state = self.state.borrow();
        Ok(Viewport {
            scroll_y: state.scroll_y,
            inner_height: INNER_HEIGHT,
            document_height: state.document_height,
        })
    }

    fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let chapter = self.current();
        Ok(match selector {
            "#totalPages" => chapter.total_pages.clone(),
            ".breadcrumb li:nth-child(2) a" => chapter.series.clone(),
            _ => None,
        })
    }

    fn title(&self) -> Result<String, BrowserError> {
        Ok(self.current().title.clone())
    }

    fn location(&self) -> Result<String, BrowserError> {
        Ok(self.current().location())
    }

    fn activate(&self, control: &NextControl) -> Result<bool, BrowserError> {
        if self.state.borrow().failing_controls.contains(control) {
            return Err(BrowserError::JavaScriptError(format!("bad matcher {}", control)));
        }
        if self.current().next.as_ref() != Some(control) {
            return Ok(false);
        }

        self.state.borrow_mut().activations.push(control.clone());
        let next = self.chapter_index() + 1;
        if next < self.chapters.len() {
            self.load(next);
        }
        Ok(true)
    }

    fn wait_for_navigation(&self, from: &str, _timeout: Duration) -> Result<(), BrowserError> {
        if self.current().location() == from {
            Err(BrowserError::Timeout(format!("navigation away from {}", from)))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct ServiceState {
    /// url -> failures still to serve
    fetch_failures: HashMap<String, u32>,
    save_rejections: u32,
    fetches: Vec<(String, Option<String>)>,
    saves: Vec<TransferUnit>,
    save_attempts: Vec<String>,
    pings: usize,
}

/// Image host and page store in one, recording every call
pub struct FakeService {
    ping_ok: bool,
    state: RefCell<ServiceState>,
    stop_after: Option<(usize, Rc<MemoryActivation>)>,
    stop_on_ping: Option<(usize, Rc<MemoryActivation>)>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            ping_ok: true,
            state: RefCell::new(ServiceState::default()),
            stop_after: None,
            stop_on_ping: None,
        }
    }

    pub fn offline() -> Self {
        Self {
            ping_ok: false,
            ..Self::new()
        }
    }

    /// Serve `times` failures for `url` before succeeding
    pub fn fail_fetch(&self, url: &str, times: u32) {
        self.state
            .borrow_mut()
            .fetch_failures
            .insert(url.to_string(), times);
    }

    pub fn reject_saves(&self, times: u32) {
        self.state.borrow_mut().save_rejections = times;
    }

    /// Clear `flag` once this many pages have been saved
    pub fn stop_after(mut self, saves: usize, flag: Rc<MemoryActivation>) -> Self {
        self.stop_after = Some((saves, flag));
        self
    }

    /// Clear `flag` while answering the `nth` liveness check
    pub fn stop_on_ping(mut self, nth: usize, flag: Rc<MemoryActivation>) -> Self {
        self.stop_on_ping = Some((nth, flag));
        self
    }

    /// Filenames of every save request, accepted or not
    pub fn save_attempts(&self) -> Vec<String> {
        self.state.borrow().save_attempts.clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.state.borrow().fetches.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn referers(&self) -> Vec<Option<String>> {
        self.state.borrow().fetches.iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn saves(&self) -> Vec<TransferUnit> {
        self.state.borrow().saves.clone()
    }

    pub fn saved_filenames(&self) -> Vec<String> {
        self.state
            .borrow()
            .saves
            .iter()
            .map(|unit| unit.filename.clone())
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.state.borrow().pings
    }
}

impl ImageFetcher for FakeService {
    async fn fetch_image(&self, url: &str, referer: Option<&str>) -> Result<FetchedImage, TransferError> {
        let mut state = self.state.borrow_mut();
        state
            .fetches
            .push((url.to_string(), referer.map(String::from)));

        if let Some(left) = state.fetch_failures.get_mut(url) {
            if *left > 0 {
                *left -= 1;
                return Err(TransferError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
        }

        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(url.as_bytes());
        Ok(FetchedImage {
            bytes,
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

impl PageStore for FakeService {
    async fn ping(&self) -> bool {
        let pings = {
            let mut state = self.state.borrow_mut();
            state.pings += 1;
            state.pings
        };
        if let Some((nth, flag)) = &self.stop_on_ping {
            if pings == *nth {
                flag.set_active(false).ok();
            }
        }
        self.ping_ok
    }

    async fn save_page(&self, unit: &TransferUnit) -> Result<(), TransferError> {
        let saved = {
            let mut state = self.state.borrow_mut();
            state.save_attempts.push(unit.filename.clone());
            if state.save_rejections > 0 {
                state.save_rejections -= 1;
                return Err(TransferError::Rejected { status: 500 });
            }
            state.saves.push(unit.clone());
            state.saves.len()
        };

        if let Some((limit, flag)) = &self.stop_after {
            if saved >= *limit {
                flag.set_active(false).ok();
            }
        }
        Ok(())
    }
}

/// Keeps every status line and alert
#[derive(Default)]
pub struct RecordingReporter {
    statuses: RefCell<Vec<String>>,
    alerts: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl StatusReporter for RecordingReporter {
    fn status(&self, message: &str) {
        self.statuses.borrow_mut().push(message.to_string());
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}
