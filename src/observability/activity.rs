//! Activity log.
//!
//! An append-only record of successful mutations, kept apart from the
//! diagnostic `tracing` output. Writing is best-effort: a sink never
//! reports failure to its caller, so a broken or missing log file can
//! never change the outcome of an add or delete.

use crate::config::ActivityLogConfig;
use chrono::Utc;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// A mutation worth recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityNotice {
    /// A memory was added.
    Added {
        /// Assigned id.
        id: i64,
        /// Stored title (may be empty).
        title: String,
        /// Stored tags (may be empty).
        tags: String,
        /// Stored status (may be empty).
        status: String,
        /// Stored content.
        content: String,
    },
    /// Memories matching a query were deleted.
    Deleted {
        /// The query used.
        query: String,
        /// How many were removed.
        removed: usize,
    },
}

impl fmt::Display for ActivityNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added {
                id,
                title,
                tags,
                status,
                content,
            } => {
                write!(f, "Added simple-memory {id}: {content:?}")?;
                for (name, value) in [("title", title), ("tags", tags), ("status", status)] {
                    if !value.is_empty() {
                        write!(f, " {name}={value:?}")?;
                    }
                }
                Ok(())
            },
            Self::Deleted { query, removed } => {
                write!(f, "Deleted {removed} simple-memories containing {query:?}")
            },
        }
    }
}

/// Destination for activity notices.
pub trait ActivitySink: Send + Sync {
    /// Records a notice. Must not fail or panic.
    fn record(&self, notice: &ActivityNotice);
}

/// Sink that drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledActivityLog;

impl ActivitySink for DisabledActivityLog {
    fn record(&self, _notice: &ActivityNotice) {}
}

/// Builds the sink described by the config.
#[must_use]
pub fn activity_sink(config: &ActivityLogConfig) -> Arc<dyn ActivitySink> {
    if config.enabled {
        Arc::new(FileActivityLog::new(config))
    } else {
        Arc::new(DisabledActivityLog)
    }
}

/// Daily-rotated activity log.
///
/// `config.path` names the log: `/tmp/activity.log` writes
/// `/tmp/activity.<YYYY-MM-DD>.log`, rolling over at UTC midnight and
/// keeping the newest `max_files` files. The appender is opened on the
/// first notice and reopened on the next notice after a failed open.
pub struct FileActivityLog {
    path: PathBuf,
    max_files: usize,
    appender: Mutex<Option<RollingFileAppender>>,
}

impl FileActivityLog {
    /// Creates a log writing next to `config.path`.
    #[must_use]
    pub fn new(config: &ActivityLogConfig) -> Self {
        Self {
            path: config.path.clone(),
            max_files: config.max_files.max(1),
            appender: Mutex::new(None),
        }
    }

    /// Returns the configured log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<RollingFileAppender> {
        let directory = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let prefix = self
            .path
            .file_stem()
            .map_or_else(|| "activity".to_string(), |s| s.to_string_lossy().into_owned());

        let mut builder = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix)
            .max_log_files(self.max_files);
        if let Some(extension) = self.path.extension() {
            builder = builder.filename_suffix(extension.to_string_lossy().into_owned());
        }
        builder.build(directory).map_err(io::Error::other)
    }

    fn append(&self, slot: &mut Option<RollingFileAppender>, bytes: &[u8]) -> io::Result<()> {
        if slot.is_none() {
            *slot = Some(self.open()?);
        }
        let Some(appender) = slot.as_mut() else {
            return Err(io::Error::other("activity log is not open"));
        };
        appender.write_all(bytes)?;
        appender.flush()
    }
}

impl ActivitySink for FileActivityLog {
    fn record(&self, notice: &ActivityNotice) {
        let line = format!(
            "{} [INFO] {notice}\n",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ")
        );
        let mut slot = self.appender.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.append(&mut slot, line.as_bytes()) {
            drop(slot);
            tracing::warn!(error = %e, "Failed to write activity log");
            metrics::counter!("activity_log_failures_total").increment(1);
        }
    }
}
