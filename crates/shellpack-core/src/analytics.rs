//! Build outcome reporting.
//!
//! The orchestrator notifies an [`Analytics`] collaborator once per build.
//! Reporting failures are logged and never change the build result.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::BuildError;
use crate::types::{Platform, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// A single build outcome notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEvent {
    pub platform: Platform,
    pub outcome: Outcome,
    /// Stage that failed, for failed builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

pub trait Analytics {
    fn track(&self, event: &BuildEvent) -> Result<(), BuildError>;
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn track(&self, _event: &BuildEvent) -> Result<(), BuildError> {
        Ok(())
    }
}

/// Appends events as JSON lines to a local file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Analytics for EventLog {
    fn track(&self, event: &BuildEvent) -> Result<(), BuildError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(event)
            .map_err(|e| BuildError::Config(format!("failed to serialize build event: {}", e)))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
