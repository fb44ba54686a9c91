//! Error taxonomy for a batch run.
//!
//! Only [`DiscoveryError`], combined-mode [`WriteError`]s and log-sink failures are fatal (see
//! [`BatchError`]). [`ExtractionError`] is recovered per file and [`DeliveryError`] is only logged.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Input directory or pattern problem. Raised before any worker starts.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input directory does not exist: {}", .0.display())]
    Missing(PathBuf),
    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot read input directory {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// A single file could not be turned into a record.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{}: {message}", .path.display())]
pub struct ExtractionError {
    pub path: PathBuf,
    pub message: String,
}

impl ExtractionError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// An output document or log sink could not be written.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} already holds the record of {}, skipping {}", .path.display(), .kept.display(), .skipped.display())]
    Collision {
        path: PathBuf,
        kept: PathBuf,
        skipped: PathBuf,
    },
    #[error("failed to rename {} -> {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The end-of-run notification could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification endpoint answered with status {0}")]
    Status(u16),
}

/// Fatal errors that end a batch run with a non-zero exit.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    State(#[from] InvalidTransition),
    #[error("failed to open log sink {}: {source}", .path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A batch run tried to leave its state machine order.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid batch state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: crate::types::BatchState,
    pub to: crate::types::BatchState,
}
