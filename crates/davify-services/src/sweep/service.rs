use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use davify_core::{extract_max_age, FileAgePolicy, LifetimeTable};
use serde::Serialize;
use tokio::time::interval;

/// Outcome of one sweep pass over a directory.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub kept: usize,
    pub failures: Vec<SweepFailure>,
}

/// A deletion that failed; the sweep continued past it.
#[derive(Debug, Serialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Periodic expiry sweeper for a single upload directory.
#[derive(Clone)]
pub struct SweepService {
    table: Arc<LifetimeTable>,
    directory: PathBuf,
    sweep_interval: Duration,
}

impl SweepService {
    pub fn new(table: Arc<LifetimeTable>, directory: impl Into<PathBuf>) -> Self {
        Self {
            table,
            directory: directory.into(),
            sweep_interval: Duration::from_secs(3600),
        }
    }

    pub fn with_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                tracing::info!(directory = %self.directory.display(), "Starting scheduled sweep of expired files");

                match self.sweep().await {
                    Ok(report) => {
                        tracing::info!(
                            removed = report.removed.len(),
                            kept = report.kept,
                            failures = report.failures.len(),
                            "Sweep task completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sweep task failed");
                    }
                }
            }
        })
    }

    /// Run a single pass now.
    pub async fn sweep(&self) -> Result<SweepReport, anyhow::Error> {
        sweep_directory(&self.directory, &self.table).await
    }
}

/// Sweep `directory` against the system clock.
pub async fn sweep_directory(
    directory: &Path,
    table: &LifetimeTable,
) -> Result<SweepReport, anyhow::Error> {
    sweep_directory_at(directory, table, SystemTime::now()).await
}

/// Sweep `directory`, deleting regular files whose age (relative to `now`)
/// strictly exceeds the lifetime encoded in their name.
///
/// Immediate entries only; directories and other non-files are ignored.
/// Files whose names do not parse, or whose code maps to "forever", are
/// kept. Per-file errors are collected into the report and never abort the
/// pass; a file that vanishes mid-sweep counts as already removed.
pub async fn sweep_directory_at(
    directory: &Path,
    table: &LifetimeTable,
    now: SystemTime,
) -> Result<SweepReport, anyhow::Error> {
    let mut report = SweepReport::default();

    let mut entries = tokio::fs::read_dir(directory)
        .await
        .with_context(|| format!("Failed to read directory {}", directory.display()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to enumerate {}", directory.display()))?
    {
        let path = entry.path();

        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to stat entry, skipping");
                report.failures.push(SweepFailure {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let max_age = match extract_max_age(&file_name.to_string_lossy(), table) {
            FileAgePolicy::Expires(max_age) => max_age,
            // Foreign files and "forever" uploads are never deleted.
            FileAgePolicy::Unknown | FileAgePolicy::NoExpiry => {
                report.kept += 1;
                continue;
            }
        };

        // A modification time in the future reads as age zero.
        let age = metadata
            .modified()
            .ok()
            .and_then(|mtime| now.duration_since(mtime).ok())
            .unwrap_or(Duration::ZERO);

        if !should_remove(age, max_age) {
            report.kept += 1;
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    age_secs = age.as_secs(),
                    max_age_secs = max_age.as_secs(),
                    "Deleted expired file"
                );
                report.removed.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // A concurrent sweep got there first.
                tracing::debug!(path = %path.display(), "File already removed");
                report.removed.push(path);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    path = %path.display(),
                    "Failed to delete expired file, continuing"
                );
                report.failures.push(SweepFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        directory = %directory.display(),
        removed = report.removed.len(),
        kept = report.kept,
        failures = report.failures.len(),
        "Sweep completed"
    );

    Ok(report)
}

/// Strict inequality: a file exactly at the boundary is kept.
fn should_remove(age: Duration, max_age: Duration) -> bool {
    age > max_age
}
