//! Aggregation: the single writer of output documents, run after all workers have finished.

use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::engine::tools::document_path_for;
use crate::error::WriteError;
use crate::record::Record;
use crate::report::RunLog;
use crate::types::{BatchResult, OutputMode};
use crate::utils::tempfiles::write_json_atomic;

/// What the aggregator wrote.
#[derive(Debug, Default)]
pub struct AggregateReport {
    pub written: Vec<PathBuf>,
    /// Separate mode: documents that failed to write (already logged).
    pub write_failures: usize,
}

/// Write the combined array of successful records, in discovery order. Any failure is fatal.
pub fn write_combined(result: &BatchResult, path: &Path) -> Result<AggregateReport, WriteError> {
    let records: Vec<&Record> = result.successes().map(|(_, record)| record).collect();
    write_json_atomic(path, &records)?;
    Ok(AggregateReport {
        written: vec![path.to_path_buf()],
        write_failures: 0,
    })
}

/// Split successes into one job per target path. Inputs that map to a path already taken by an
/// earlier file in discovery order (`x.log` and `x.out`) become collision errors.
fn plan_documents<'a>(
    result: &'a BatchResult,
    out_dir: &Path,
) -> (Vec<(PathBuf, &'a Record)>, Vec<WriteError>) {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    let mut jobs = Vec::new();
    let mut collisions = Vec::new();
    for (file, record) in result.successes() {
        let path = document_path_for(file, out_dir);
        match owners.get(&path) {
            Some(kept) => collisions.push(WriteError::Collision {
                path,
                kept: kept.to_path_buf(),
                skipped: file.path.clone(),
            }),
            None => {
                owners.insert(path.clone(), &file.path);
                jobs.push((path, record));
            }
        }
    }
    (jobs, collisions)
}

/// Write one document per success under `out_dir`. A failed document is logged and counted; the
/// others are still written. Each target path has exactly one writer.
pub fn write_separate(result: &BatchResult, out_dir: &Path, log: &RunLog) -> AggregateReport {
    let (jobs, collisions) = plan_documents(result, out_dir);

    let results: Vec<Result<PathBuf, WriteError>> = jobs
        .par_iter()
        .map(|(path, record)| write_json_atomic(path, record).map(|()| path.clone()))
        .collect();

    let mut report = AggregateReport::default();
    for r in results.into_iter().chain(collisions.into_iter().map(Err)) {
        match r {
            Ok(path) => report.written.push(path),
            Err(e) => {
                log.error(format!("Failed to write document: {}", e));
                report.write_failures += 1;
            }
        }
    }
    report
}

/// Dispatch on the output mode. Only combined-mode failures propagate.
pub fn aggregate(
    result: &BatchResult,
    mode: &OutputMode,
    log: &RunLog,
) -> Result<AggregateReport, WriteError> {
    match mode {
        OutputMode::Combined(path) => write_combined(result, path),
        OutputMode::Separate(dir) => Ok(write_separate(result, dir, log)),
    }
}
