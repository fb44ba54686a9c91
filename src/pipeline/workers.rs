//! Worker pool: run the extractor over every discovered file on a bounded set of threads.
//!
//! Jobs are `(index, file)` pairs on a pre-filled channel. Each worker sends `(index, outcome)` back;
//! the collecting thread drops each outcome into its own slot, so the result comes out in discovery
//! order whatever order workers finish in.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::engine::progress::Progress;
use crate::engine::tools::panic_message;
use crate::extract::Extractor;
use crate::report::RunLog;
use crate::types::{BatchResult, FailureDetail, InputFile, ParseOutcome};

/// Shared, read-only state handed to every worker.
pub struct WorkerContext<'a> {
    pub extractor: &'a dyn Extractor,
    pub log: &'a RunLog,
    pub progress: &'a Progress,
    pub cancel: &'a AtomicBool,
    /// When a progress bar is on screen, successes go to the info file only.
    pub quiet_console: bool,
}

/// Invoke the extractor once for `file`, turning errors and panics into a failure outcome.
pub fn process_file(file: &InputFile, extractor: &dyn Extractor) -> ParseOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(&file.path))) {
        Ok(Ok(record)) => ParseOutcome::Success {
            file: file.clone(),
            record,
        },
        Ok(Err(e)) => ParseOutcome::Failure {
            file: file.clone(),
            detail: FailureDetail::Extraction(e),
        },
        Err(payload) => ParseOutcome::Failure {
            file: file.clone(),
            detail: FailureDetail::Panicked(panic_message(payload.as_ref())),
        },
    }
}

fn log_outcome(outcome: &ParseOutcome, ctx: &WorkerContext<'_>) {
    match outcome {
        ParseOutcome::Success { file, record } => {
            let atoms = record
                .atom_count()
                .map_or_else(|| "unknown".to_string(), |n| n.to_string());
            let msg = format!(
                "Parsed {}: {} atoms, {} SCF energies",
                file.name(),
                atoms,
                record.scf_count()
            );
            if ctx.quiet_console {
                ctx.log.info_file_only(msg);
            } else {
                ctx.log.info(msg);
            }
        }
        ParseOutcome::Failure {
            detail: FailureDetail::Cancelled,
            ..
        } => {}
        ParseOutcome::Failure { file, detail } => {
            ctx.log
                .error(format!("[{}] failed to parse: {}", file.name(), detail));
        }
    }
}

/// Single worker: pull jobs until the channel is empty. After cancellation, remaining jobs are
/// answered with `Cancelled` without calling the extractor.
fn worker_loop<'f>(
    job_rx: Receiver<(usize, &'f InputFile)>,
    outcome_tx: Sender<(usize, ParseOutcome)>,
    ctx: &WorkerContext<'_>,
) {
    while let Ok((idx, file)) = job_rx.recv() {
        let outcome = if ctx.cancel.load(Ordering::Relaxed) {
            ParseOutcome::Failure {
                file: file.clone(),
                detail: FailureDetail::Cancelled,
            }
        } else {
            let outcome = process_file(file, ctx.extractor);
            log_outcome(&outcome, ctx);
            ctx.progress.advance();
            outcome
        };
        if outcome_tx.send((idx, outcome)).is_err() {
            break;
        }
    }
}

/// Process every file with `num_workers` threads. Returns one outcome per file, in input order.
pub fn run_workers(files: &[InputFile], num_workers: usize, ctx: &WorkerContext<'_>) -> BatchResult {
    let (job_tx, job_rx) = unbounded::<(usize, &InputFile)>();
    for job in files.iter().enumerate() {
        // Receiver is alive; send on an unbounded channel cannot fail here.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let (outcome_tx, outcome_rx) = unbounded::<(usize, ParseOutcome)>();
    let mut slots: Vec<Option<ParseOutcome>> = vec![None; files.len()];

    thread::scope(|s| {
        for worker_id in 0..num_workers.max(1) {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            s.spawn(move || {
                worker_loop(job_rx, outcome_tx, ctx);
                debug!("worker {} done", worker_id);
            });
        }
        // Dropping the last sender closes the channel once all workers exit.
        drop(outcome_tx);
        for (idx, outcome) in outcome_rx.iter() {
            debug_assert!(slots[idx].is_none(), "file {idx} processed twice");
            slots[idx] = Some(outcome);
        }
    });

    // An empty slot means the job was never answered; it still gets exactly one outcome.
    let outcomes = slots
        .into_iter()
        .zip(files)
        .map(|(slot, file)| {
            slot.unwrap_or_else(|| ParseOutcome::Failure {
                file: file.clone(),
                detail: FailureDetail::Panicked("worker exited before reporting".to_string()),
            })
        })
        .collect();
    BatchResult { outcomes }
}
