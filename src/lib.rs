//! Gaussparse: batch converter from Gaussian log files to normalized JSON records

pub mod engine;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::{BatchError, DeliveryError, DiscoveryError, ExtractionError, WriteError};
pub use extract::{Extractor, GaussianExtractor};
pub use record::{Record, Value};
pub use report::Notifier;

use std::sync::atomic::AtomicBool;

/// Result alias used by public gaussparse API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point for library callers: run a full batch with `extractor` and no notification.
///
/// Equivalent to [`pipeline::run_batch`] with `notifier: None` and a cancel flag that is never set.
/// Per-file failures are reported in the returned [`RunSummary`]; `Err` means discovery or the
/// combined-mode write failed.
pub fn parse_dir(opts: &Opts, extractor: &dyn Extractor) -> Result<RunSummary> {
    let never_cancel = AtomicBool::new(false);
    Ok(pipeline::run_batch(opts, extractor, None, &never_cancel)?)
}
