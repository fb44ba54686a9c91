//! Run orchestration: the per-run state machine and the discover, process, aggregate, report
//! sequence.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::engine::progress::Progress;
use crate::error::{BatchError, InvalidTransition};
use crate::extract::Extractor;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::discover::discover_files;
use crate::pipeline::workers::{WorkerContext, run_workers};
use crate::report::{Notifier, RunLog, send_notification, summary_message};
use crate::types::{BatchState, NotifyStatus, Opts, RunSummary};
use crate::utils::config::WorkerThreadLimits;

/// Enforces `Init → Discovering → Processing → Aggregating → Reporting → Done`, one step at a time.
#[derive(Debug)]
pub struct StateTracker {
    state: BatchState,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            state: BatchState::Init,
        }
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn enter(&mut self, to: BatchState) -> Result<(), InvalidTransition> {
        if self.state.next() != Some(to) {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!("batch state {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }
}

/// Run one batch: discover, process in parallel, aggregate, report.
///
/// Per-file failures are counted in the summary, never returned. `Err` means a fatal setup or
/// combined-mode write failure. When `cancel` is set mid-run, completed outcomes are still written
/// and the summary comes back with `cancelled: true`.
pub fn run_batch(
    opts: &Opts,
    extractor: &dyn Extractor,
    notifier: Option<&dyn Notifier>,
    cancel: &AtomicBool,
) -> Result<RunSummary, BatchError> {
    let start = Instant::now();
    let mut machine = StateTracker::new();
    let log = RunLog::open(&opts.info_log, &opts.error_log)?;
    log.info(format!(
        "Starting parsing process for directory: {}",
        opts.input_dir.display()
    ));

    machine.enter(BatchState::Discovering)?;
    let discovery = match discover_files(&opts.input_dir, &opts.pattern) {
        Ok(d) => d,
        Err(e) => {
            log.error(format!("Discovery failed: {}", e));
            return Err(e.into());
        }
    };
    for (path, msg) in &discovery.skipped {
        log.warn(format!("Skipped unreadable path {}: {}", path.display(), msg));
    }
    let files = discovery.files;
    if files.is_empty() {
        log.warn(format!(
            "No files matched '{}' in {}",
            opts.pattern,
            discovery.root.display()
        ));
    } else {
        log.info(format!("Found {} files to process", files.len()));
    }

    machine.enter(BatchState::Processing)?;
    let num_workers = WorkerThreadLimits::current().resolve(opts.jobs, files.len());
    debug!("Using {} workers", num_workers);
    let progress = Progress::new(files.len(), opts.progress);
    let ctx = WorkerContext {
        extractor,
        log: &log,
        progress: &progress,
        cancel,
        quiet_console: progress.has_bar(),
    };
    let result = run_workers(&files, num_workers, &ctx);
    progress.finish();
    let cancelled = cancel.load(Ordering::Relaxed);
    if cancelled {
        log.warn(format!(
            "Run cancelled: {} of {} files completed, writing completed results",
            progress.completed(),
            files.len()
        ));
    }

    machine.enter(BatchState::Aggregating)?;
    let report = match aggregate(&result, &opts.mode, &log) {
        Ok(r) => r,
        Err(e) => {
            log.error(format!("Failed to write output: {}", e));
            return Err(e.into());
        }
    };

    machine.enter(BatchState::Reporting)?;
    let mut summary = RunSummary {
        state: machine.state(),
        discovered: files.len(),
        succeeded: result.succeeded(),
        failed: result.failed(),
        write_failures: report.write_failures,
        documents_written: report.written.len(),
        output: opts.mode.clone(),
        elapsed: start.elapsed(),
        cancelled,
        notify: NotifyStatus::NotConfigured,
    };
    log.info(&summary);
    let message = summary_message(&summary, &discovery.root);
    summary.notify = send_notification(notifier, &message, &log);

    machine.enter(BatchState::Done)?;
    summary.state = machine.state();
    log.info(format!(
        "Parsing completed. Processed {} files.",
        summary.discovered
    ));
    log.close();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_walks_states_in_order() {
        let mut t = StateTracker::new();
        for s in [
            BatchState::Discovering,
            BatchState::Processing,
            BatchState::Aggregating,
            BatchState::Reporting,
            BatchState::Done,
        ] {
            t.enter(s).unwrap();
        }
        assert_eq!(t.state(), BatchState::Done);
    }

    #[test]
    fn tracker_rejects_skips_and_repeats() {
        let mut t = StateTracker::new();
        assert_eq!(
            t.enter(BatchState::Processing),
            Err(InvalidTransition {
                from: BatchState::Init,
                to: BatchState::Processing
            })
        );
        t.enter(BatchState::Discovering).unwrap();
        assert!(t.enter(BatchState::Discovering).is_err());
        assert_eq!(t.state(), BatchState::Discovering);
    }
}
