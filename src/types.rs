//! Public and internal types for the gaussparse API and pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExtractionError;
use crate::record::Record;

/// One discovered input file. `path` is absolute (under the canonical root), `rel` is relative to it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputFile {
    pub path: PathBuf,
    pub rel: PathBuf,
}

impl InputFile {
    pub fn new(root: &Path, rel: impl Into<PathBuf>) -> Self {
        let rel = rel.into();
        Self {
            path: root.join(&rel),
            rel,
        }
    }

    /// File name for log lines and the record's `file` field.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name())
    }
}

/// Why a file produced no record.
#[derive(Clone, Debug, PartialEq)]
pub enum FailureDetail {
    /// The extractor rejected the file.
    Extraction(ExtractionError),
    /// The extractor panicked; holds the panic message.
    Panicked(String),
    /// The run was cancelled before this file was started.
    Cancelled,
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::Extraction(e) => write!(f, "{}", e.message),
            FailureDetail::Panicked(msg) => write!(f, "extractor panicked: {msg}"),
            FailureDetail::Cancelled => write!(f, "cancelled before processing"),
        }
    }
}

/// Result of processing one [`InputFile`]. Exactly one per file.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseOutcome {
    Success { file: InputFile, record: Record },
    Failure { file: InputFile, detail: FailureDetail },
}

impl ParseOutcome {
    pub fn file(&self) -> &InputFile {
        match self {
            ParseOutcome::Success { file, .. } | ParseOutcome::Failure { file, .. } => file,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            ParseOutcome::Success { record, .. } => Some(record),
            ParseOutcome::Failure { .. } => None,
        }
    }
}

/// Outcomes of a run, in discovery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchResult {
    pub outcomes: Vec<ParseOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    ParseOutcome::Failure {
                        detail: FailureDetail::Cancelled,
                        ..
                    }
                )
            })
            .count()
    }

    /// Successful `(file, record)` pairs in discovery order.
    pub fn successes(&self) -> impl Iterator<Item = (&InputFile, &Record)> {
        self.outcomes.iter().filter_map(|o| match o {
            ParseOutcome::Success { file, record } => Some((file, record)),
            ParseOutcome::Failure { .. } => None,
        })
    }
}

/// Where and how output documents are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON array at this path.
    Combined(PathBuf),
    /// One document per input file under this directory.
    Separate(PathBuf),
}

impl OutputMode {
    pub fn location(&self) -> &Path {
        match self {
            OutputMode::Combined(p) | OutputMode::Separate(p) => p,
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Combined(p) => write!(f, "combined file {}", p.display()),
            OutputMode::Separate(p) => write!(f, "separate files in {}", p.display()),
        }
    }
}

/// Fully resolved options for one batch run (defaults < settings file < CLI).
#[derive(Clone, Debug)]
pub struct Opts {
    pub input_dir: PathBuf,
    /// Glob matched against paths relative to `input_dir`.
    pub pattern: String,
    pub mode: OutputMode,
    /// Worker count override. When None, derived from available parallelism and the FD limit.
    pub jobs: Option<usize>,
    pub info_log: PathBuf,
    pub error_log: PathBuf,
    /// Show the progress bar.
    pub progress: bool,
    pub verbose: bool,
    /// Webhook for the end-of-run message. None disables notification.
    pub notify_url: Option<String>,
}

/// Per-run state machine. Every run walks these in order; only `Processing` runs concurrent work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BatchState {
    Init,
    Discovering,
    Processing,
    Aggregating,
    Reporting,
    Done,
}

impl BatchState {
    pub fn next(self) -> Option<BatchState> {
        match self {
            BatchState::Init => Some(BatchState::Discovering),
            BatchState::Discovering => Some(BatchState::Processing),
            BatchState::Processing => Some(BatchState::Aggregating),
            BatchState::Aggregating => Some(BatchState::Reporting),
            BatchState::Reporting => Some(BatchState::Done),
            BatchState::Done => None,
        }
    }
}

/// What happened to the end-of-run notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifyStatus {
    NotConfigured,
    Sent,
    Failed(String),
}

/// Summary of a finished run. Printed and logged even on partial failure.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub state: BatchState,
    pub discovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Separate mode only: documents that could not be written.
    pub write_failures: usize,
    /// Documents actually written (1 in combined mode, one per success in separate mode).
    pub documents_written: usize,
    pub output: OutputMode,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub notify: NotifyStatus,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} files: {} succeeded, {} failed. Wrote {} document(s) to {} in {:.2}s",
            self.discovered,
            self.succeeded,
            self.failed,
            self.documents_written,
            self.output,
            self.elapsed.as_secs_f64()
        )?;
        if self.write_failures > 0 {
            write!(f, " ({} write failure(s))", self.write_failures)?;
        }
        Ok(())
    }
}
