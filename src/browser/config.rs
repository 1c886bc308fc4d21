use std::time::Duration;

/// Chrome flags every bridge browser gets
const BASE_FLAGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Configuration for browser instances
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window size; lazy loaders key off the viewport height
    pub window_size: (u32, u32),

    /// Custom user agent
    pub user_agent: Option<String>,

    /// Navigation timeout in seconds
    pub timeout_seconds: u64,

    /// Additional Chrome flags
    pub chrome_flags: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            timeout_seconds: 30,
            chrome_flags: vec![],
        }
    }
}

impl BrowserConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Every flag passed to Chrome, in launch order
    pub fn launch_flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = BASE_FLAGS.iter().map(|f| f.to_string()).collect();
        if let Some(ua) = &self.user_agent {
            flags.push(format!("--user-agent={}", ua));
        }
        flags.extend(self.chrome_flags.iter().cloned());
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_size, (1920, 1080));
        assert!(config.user_agent.is_some());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_launch_flags_include_user_agent_and_extras() {
        let mut config = BrowserConfig::default();
        config.user_agent = Some("TestAgent/1.0".to_string());
        config.chrome_flags = vec!["--no-sandbox".to_string()];

        let flags = config.launch_flags();
        assert!(flags.iter().any(|f| f.contains("AutomationControlled")));
        assert!(flags.contains(&"--user-agent=TestAgent/1.0".to_string()));
        assert_eq!(flags.last().map(String::as_str), Some("--no-sandbox"));
    }

    #[test]
    fn test_no_user_agent_flag_when_unset() {
        let mut config = BrowserConfig::default();
        config.user_agent = None;
        assert!(!config.launch_flags().iter().any(|f| f.starts_with("--user-agent")));
    }
}
