//! Pipeline components: discovery, worker pool, aggregation and the run orchestrator.

pub mod aggregate;
pub mod discover;
pub mod orchestrator;
pub mod workers;

pub use aggregate::{AggregateReport, aggregate, write_combined, write_separate};
pub use discover::{Discovery, discover_files, normalize_pattern, walk_depth};
pub use orchestrator::{StateTracker, run_batch};
pub use workers::{WorkerContext, process_file, run_workers};
