//! The activation flag: the one bit of state that outlives a run.
//!
//! It is written when a run starts, on every abort, and by `manga-bridge
//! stop`. A running bridge reads it before each page and before each chapter,
//! so clearing it from another process stops the run at the next page
//! boundary.

use crate::error::BridgeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub trait ActivationFlag {
    fn is_active(&self) -> bool;
    fn set_active(&self, active: bool) -> Result<(), BridgeError>;
}

/// On-disk form of the flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Flag persisted as a small JSON file
#[derive(Debug, Clone)]
pub struct FileActivation {
    path: PathBuf,
}

impl FileActivation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current record, if the file exists and parses
    pub fn read(&self) -> Option<ActivationRecord> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Unreadable activation file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl ActivationFlag for FileActivation {
    fn is_active(&self) -> bool {
        self.read().map(|r| r.active).unwrap_or(false)
    }

    fn set_active(&self, active: bool) -> Result<(), BridgeError> {
        let record = ActivationRecord {
            active,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| BridgeError::State(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        log::debug!("Activation flag set to {} in {}", active, self.path.display());
        Ok(())
    }
}

/// Flag held in memory for the life of the process
#[derive(Debug, Default)]
pub struct MemoryActivation(AtomicBool);

impl MemoryActivation {
    pub fn new(active: bool) -> Self {
        Self(AtomicBool::new(active))
    }
}

impl ActivationFlag for MemoryActivation {
    fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set_active(&self, active: bool) -> Result<(), BridgeError> {
        self.0.store(active, Ordering::SeqCst);
        Ok(())
    }
}
