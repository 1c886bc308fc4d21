use crate::error::BridgeError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the local page store; a GET here is the liveness check
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path appended to `server_url` for page uploads
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Liveness check timeout in milliseconds
    #[serde(default = "default_liveness_timeout")]
    pub liveness_timeout_ms: u64,

    /// Regex a page image's locator must match (unanchored)
    #[serde(default = "default_image_pattern")]
    pub image_pattern: String,

    /// Element whose text holds the declared page count
    #[serde(default = "default_expected_count_selector")]
    pub expected_count_selector: String,

    /// Element whose text names the series
    #[serde(default = "default_breadcrumb_selector")]
    pub breadcrumb_selector: String,

    /// Minimum natural height for an image to count as real content
    #[serde(default = "default_min_height")]
    pub min_height: u32,

    #[serde(default = "default_readiness_interval")]
    pub readiness_interval_ms: u64,

    #[serde(default = "default_readiness_attempts")]
    pub readiness_attempts: u32,

    /// Pixels per forced-scroll tick
    #[serde(default = "default_scroll_step")]
    pub scroll_step: i64,

    #[serde(default = "default_scroll_interval")]
    pub scroll_interval_ms: u64,

    /// How close (px) the viewport bottom must get to the document end
    #[serde(default = "default_scroll_tolerance")]
    pub scroll_tolerance: f64,

    /// Pause before the single retry of a failed page
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Pause between the last page and the next-chapter click
    #[serde(default = "default_advance_delay")]
    pub advance_delay_ms: u64,

    /// Pause after a new chapter loads before work starts
    #[serde(default = "default_resume_delay")]
    pub resume_delay_ms: u64,

    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Per-request timeout for image and page store requests. Unset means
    /// requests wait as long as the connection does.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Where the activation flag is persisted
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Stop after this many chapters (unbounded when absent)
    #[serde(default)]
    pub max_chapters: Option<usize>,

    /// Structural next-chapter selectors, tried after the labelled control
    #[serde(default = "default_next_selectors")]
    pub next_selectors: Vec<String>,

    /// Link texts searched last
    #[serde(default = "default_next_markers")]
    pub next_markers: Vec<String>,

    #[serde(default)]
    pub browser: BrowserSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Additional Chrome flags
    #[serde(default)]
    pub chrome_flags: Vec<String>,
}

fn default_true() -> bool { true }
fn default_server_url() -> String { "http://127.0.0.1:5000".to_string() }
fn default_save_path() -> String { "/save_page".to_string() }
fn default_liveness_timeout() -> u64 { 2000 }
fn default_image_pattern() -> String { "storage".to_string() }
fn default_expected_count_selector() -> String { "#totalPages".to_string() }
fn default_breadcrumb_selector() -> String { ".breadcrumb li:nth-child(2) a".to_string() }
fn default_min_height() -> u32 { 300 }
fn default_readiness_interval() -> u64 { 100 }
fn default_readiness_attempts() -> u32 { 60 }
fn default_scroll_step() -> i64 { 1000 }
fn default_scroll_interval() -> u64 { 100 }
fn default_scroll_tolerance() -> f64 { 50.0 }
fn default_retry_backoff() -> u64 { 3000 }
fn default_advance_delay() -> u64 { 2000 }
fn default_resume_delay() -> u64 { 4000 }
fn default_navigation_timeout() -> u64 { 30 }
fn default_state_file() -> PathBuf { PathBuf::from(".manga_bridge_state.json") }
fn default_window_width() -> u32 { 1920 }
fn default_window_height() -> u32 { 1080 }

fn default_next_selectors() -> Vec<String> {
    [".next_page", ".next-post", ".nav-next a", "a.next_page"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_next_markers() -> Vec<String> {
    ["Next", "next", "NEXT", ">"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            chrome_flags: vec![],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            save_path: default_save_path(),
            liveness_timeout_ms: default_liveness_timeout(),
            image_pattern: default_image_pattern(),
            expected_count_selector: default_expected_count_selector(),
            breadcrumb_selector: default_breadcrumb_selector(),
            min_height: default_min_height(),
            readiness_interval_ms: default_readiness_interval(),
            readiness_attempts: default_readiness_attempts(),
            scroll_step: default_scroll_step(),
            scroll_interval_ms: default_scroll_interval(),
            scroll_tolerance: default_scroll_tolerance(),
            retry_backoff_ms: default_retry_backoff(),
            advance_delay_ms: default_advance_delay(),
            resume_delay_ms: default_resume_delay(),
            navigation_timeout_secs: default_navigation_timeout(),
            request_timeout_secs: None,
            state_file: default_state_file(),
            max_chapters: None,
            next_selectors: default_next_selectors(),
            next_markers: default_next_markers(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            match Self::from_path(path) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("Ignoring config.toml: {}", e),
            }
        }
        Self::default()
    }

    /// Load an explicit config file; errors are reported, not swallowed
    pub fn from_path(path: &Path) -> Result<Self, BridgeError> {
        let content = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str::<Config>(&content)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Full upload URL
    pub fn save_url(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.save_path.trim_start_matches('/')
        )
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl BrowserSettings {
    /// Browser launch configuration from these settings
    pub fn to_browser_config(&self, timeout: Duration) -> crate::browser::BrowserConfig {
        let mut config = crate::browser::BrowserConfig::default();
        config.headless = self.headless;
        config.window_size = (self.window_width, self.window_height);
        config.timeout_seconds = timeout.as_secs().max(1);
        config.chrome_flags = self.chrome_flags.clone();
        if self.user_agent.is_some() {
            config.user_agent = self.user_agent.clone();
        }
        config
    }
}
