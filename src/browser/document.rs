use super::manager::BrowserError;
use crate::document::{Document, NextControl};
use crate::models::{ElementId, PageElement, Viewport};
use headless_chrome::Tab;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Serialises an `<img>` into the `PageElement` shape. Elements get a
/// `data-bridge-id` the first time they are seen so handles stay valid when
/// the reader inserts nodes.
const DESCRIBE_IMAGE: &str = r#"
    function describe(img) {
        if (!img.dataset.bridgeId) {
            window.__bridgeSeq = (window.__bridgeSeq || 0) + 1;
            img.dataset.bridgeId = String(window.__bridgeSeq);
        }
        return {
            id: Number(img.dataset.bridgeId),
            src: img.src || null,
            data_src: img.getAttribute('data-src'),
            data_lazy_src: img.getAttribute('data-lazy-src'),
            complete: img.complete,
            natural_height: img.naturalHeight
        };
    }
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// `Document` backed by a headless Chrome tab
pub struct ChromeDocument {
    tab: Arc<Tab>,
    load_timeout: Duration,
}

impl ChromeDocument {
    pub fn new(tab: Arc<Tab>, load_timeout: Duration) -> Self {
        Self { tab, load_timeout }
    }

    /// Navigate to a URL and wait for page load
    pub fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        log::info!("Browser navigating to: {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::NavigationError(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationError(format!("Navigation timeout for {}: {}", url, e)))?;

        self.wait_for_body()
    }

    fn wait_for_body(&self) -> Result<(), BrowserError> {
        self.tab
            .wait_for_element_with_custom_timeout("body", self.load_timeout)
            .map(|_| ())
            .map_err(|e| BrowserError::Timeout(format!("document body: {}", e)))
    }

    /// Run a script that returns `JSON.stringify(...)` and decode it
    fn eval_json<T: DeserializeOwned>(&self, script: &str) -> Result<T, BrowserError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

        let raw = result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::ScriptResultError("script returned no string".to_string()))?;

        serde_json::from_str(raw).map_err(|e| BrowserError::ScriptResultError(e.to_string()))
    }

    /// Run a script for its side effect
    fn eval(&self, script: &str) -> Result<(), BrowserError> {
        self.tab
            .evaluate(script, false)
            .map(|_| ())
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))
    }
}

/// JS string literal for `s`
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn image_query(id: ElementId) -> String {
    format!("document.querySelector('img[data-bridge-id=\"{}\"]')", id.0)
}

impl Document for ChromeDocument {
    fn images(&self) -> Result<Vec<PageElement>, BrowserError> {
        let script = format!(
            "(() => {{ {} return JSON.stringify(Array.from(document.querySelectorAll('img')).map(describe)); }})()",
            DESCRIBE_IMAGE
        );
        self.eval_json(&script)
    }

    fn image(&self, id: ElementId) -> Result<Option<PageElement>, BrowserError> {
        let script = format!(
            "(() => {{ {} const img = {}; return JSON.stringify(img ? describe(img) : null); }})()",
            DESCRIBE_IMAGE,
            image_query(id)
        );
        self.eval_json(&script)
    }

    fn scroll_into_view(&self, id: ElementId) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const img = {}; if (img) img.scrollIntoView({{behavior: 'auto', block: 'center'}}); }})()",
            image_query(id)
        );
        self.eval(&script)
    }

    fn scroll_to_top(&self) -> Result<(), BrowserError> {
        self.eval("window.scrollTo(0, 0);")
    }

    fn scroll_by(&self, dy: i64) -> Result<(), BrowserError> {
        self.eval(&format!("window.scrollBy(0, {});", dy))
    }

    fn viewport(&self) -> Result<Viewport, BrowserError> {
        self.eval_json(
            "JSON.stringify({ scrollY: window.scrollY, innerHeight: window.innerHeight, \
             documentHeight: document.body ? document.body.offsetHeight : 0 })",
        )
    }

    fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return JSON.stringify(el ? el.innerText.trim() : null); }})()",
            js_string(selector)
        );
        self.eval_json(&script)
    }

    fn title(&self) -> Result<String, BrowserError> {
        self.tab
            .get_title()
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))
    }

    fn location(&self) -> Result<String, BrowserError> {
        Ok(self.tab.get_url())
    }

    fn activate(&self, control: &NextControl) -> Result<bool, BrowserError> {
        let finder = match control {
            NextControl::Selector(sel) => format!("document.querySelector({})", js_string(sel)),
            // Mirrors XPath `//a[contains(text(), marker)]`: only the link's
            // first own text node counts.
            NextControl::LinkText(marker) => format!(
                "Array.from(document.querySelectorAll('a')).find(a => {{ \
                   const t = Array.from(a.childNodes).find(n => n.nodeType === 3); \
                   return t && t.textContent.includes({}); }})",
                js_string(marker)
            ),
        };
        let script = format!(
            "(() => {{ const el = {}; if (!el) return JSON.stringify(false); el.click(); return JSON.stringify(true); }})()",
            finder
        );
        self.eval_json(&script)
    }

    fn wait_for_navigation(&self, from: &str, timeout: Duration) -> Result<(), BrowserError> {
        let start = Instant::now();

        while self.tab.get_url() == from {
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout(format!("navigation away from {}", from)));
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::NavigationError(e.to_string()))?;

        self.wait_for_body()
    }
}
