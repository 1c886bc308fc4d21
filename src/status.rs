//! Operator-facing signals: a running status line and blocking alerts.

pub trait StatusReporter {
    /// Short progress line, replaced by the next one
    fn status(&self, message: &str);

    /// Something the operator has to act on; the run has stopped
    fn alert(&self, message: &str);
}

/// Reports through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn status(&self, message: &str) {
        log::info!("[status] {}", message);
    }

    fn alert(&self, message: &str) {
        log::error!("[alert] {}", message);
    }
}
