//! Engine module: CLI surface, progress tracking and path helpers

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, SampleCli};
pub use cli::{build_opts, handle_run, handle_sample, request_cancel, sample_file};
pub use progress::Progress;
pub use tools::{document_path_for, panic_message, path_relative_to, sample_output_path};
