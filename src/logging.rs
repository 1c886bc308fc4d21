use crate::error::BridgeError;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// Initialise logging from a log4rs YAML file, or a plain console logger at
/// `level` when the file is missing.
///
/// With `verbose` the root level is raised to `debug` in either case. The
/// YAML file is loaded once, so its `refresh_rate` is not honoured.
pub fn init(config_file: &Path, level: LevelFilter, verbose: bool) -> Result<(), BridgeError> {
    let level = if verbose { LevelFilter::Debug } else { level };

    if config_file.exists() {
        let config = file_config(config_file, verbose.then_some(level))?;
        return log4rs::init_config(config)
            .map(|_| ())
            .map_err(|e| BridgeError::Config(e.to_string()));
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| BridgeError::Config(e.to_string()))?;

    log4rs::init_config(config)
        .map(|_| ())
        .map_err(|e| BridgeError::Config(e.to_string()))
}

/// Parse a log4rs YAML file, optionally forcing the root level
fn file_config(path: &Path, root_level: Option<LevelFilter>) -> Result<Config, BridgeError> {
    let mut config = log4rs::config::load_config_file(path, Default::default())
        .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;
    if let Some(level) = root_level {
        config.root_mut().set_level(level);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const YAML: &str = "appenders:\n  stdout:\n    kind: console\nroot:\n  level: info\n  appenders:\n    - stdout\n";

    #[test]
    fn test_file_level_kept_without_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log4rs.yml");
        fs::write(&path, YAML).unwrap();

        let config = file_config(&path, None).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Info);
    }

    #[test]
    fn test_verbose_overrides_file_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log4rs.yml");
        fs::write(&path, YAML).unwrap();

        let config = file_config(&path, Some(LevelFilter::Debug)).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Debug);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log4rs.yml");
        fs::write(&path, "root: [").unwrap();

        assert!(matches!(file_config(&path, None), Err(BridgeError::Config(_))));
    }
}
