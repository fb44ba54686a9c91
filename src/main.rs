//! Gaussparse CLI: parse a directory of Gaussian logs into JSON.

use anyhow::Result;
use clap::Parser;
use gaussparse::engine::arg_parser::Cli;
use gaussparse::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
