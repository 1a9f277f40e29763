//! Diagnostic sink injected into the pipeline
//!
//! Stages report progress, recovered failures and fatal-failure snapshots here
//! instead of writing to global state. [`LogSink`] forwards to the `log` facade
//! and can persist snapshots; [`MemorySink`] keeps everything for inspection.

use crate::error::{ErrorKind, ScrapeError, StageId};
use log::Level;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One event emitted by a pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: StageId,
    pub level: Level,
    /// Set when the event records a failure
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Diagnostic {
    pub fn info(stage: StageId, message: impl Into<String>) -> Self {
        Self {
            stage,
            level: Level::Info,
            kind: None,
            message: message.into(),
        }
    }

    /// A failure the stage absorbed
    pub fn recovered(stage: StageId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            level: Level::Warn,
            kind: Some(kind),
            message: message.into(),
        }
    }

    pub fn fatal(error: &ScrapeError) -> Self {
        Self {
            stage: error.stage,
            level: Level::Error,
            kind: Some(error.kind),
            message: error.message.clone(),
        }
    }
}

/// Page state captured when a stage fails fatally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub stage: StageId,
    pub markup: Option<String>,
    /// PNG bytes
    pub screenshot: Option<Vec<u8>>,
}

/// Receiver for pipeline diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);

    /// Receive a failure snapshot. Ignored by default.
    fn snapshot(&self, _artifact: Artifact) {}
}

/// Forwards diagnostics to the `log` facade and optionally writes snapshots
/// as `<stage>.html` / `<stage>.png` under an artifact directory.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    artifact_dir: Option<PathBuf>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: persist snapshots under `dir`
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    fn write_artifact(dir: &Path, artifact: &Artifact) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        if let Some(markup) = &artifact.markup {
            let path = dir.join(format!("{}.html", artifact.stage));
            std::fs::write(&path, markup)?;
            written.push(path);
        }
        if let Some(png) = &artifact.screenshot {
            let path = dir.join(format!("{}.png", artifact.stage));
            std::fs::write(&path, png)?;
            written.push(path);
        }
        Ok(written)
    }
}

impl DiagnosticSink for LogSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            Some(kind) => log::log!(diagnostic.level, "[{}] {}: {}", diagnostic.stage, kind, diagnostic.message),
            None => log::log!(diagnostic.level, "[{}] {}", diagnostic.stage, diagnostic.message),
        }
    }

    fn snapshot(&self, artifact: Artifact) {
        let Some(dir) = &self.artifact_dir else {
            log::debug!("[{}] Snapshot captured, no artifact directory configured", artifact.stage);
            return;
        };

        match Self::write_artifact(dir, &artifact) {
            Ok(paths) => {
                for path in paths {
                    log::error!("[{}] Saved page snapshot to {}", artifact.stage, path.display());
                }
            }
            Err(e) => log::error!("[{}] Failed to save page snapshot: {}", artifact.stage, e),
        }
    }
}

/// Records every diagnostic and snapshot in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    artifacts: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        lock(&self.diagnostics).clone()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        lock(&self.artifacts).clone()
    }

    /// Diagnostics recorded with the given failure kind
    pub fn with_kind(&self, kind: ErrorKind) -> Vec<Diagnostic> {
        lock(&self.diagnostics)
            .iter()
            .filter(|d| d.kind == Some(kind))
            .cloned()
            .collect()
    }

    /// Diagnostics recorded by the given stage
    pub fn for_stage(&self, stage: StageId) -> Vec<Diagnostic> {
        lock(&self.diagnostics)
            .iter()
            .filter(|d| d.stage == stage)
            .cloned()
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        lock(&self.diagnostics).push(diagnostic);
    }

    fn snapshot(&self, artifact: Artifact) {
        lock(&self.artifacts).push(artifact);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
