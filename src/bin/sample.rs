//! Gaussparse sample CLI: parse one Gaussian log and save its record as JSON.

use anyhow::Result;
use clap::Parser;
use gaussparse::engine::arg_parser::SampleCli;
use gaussparse::engine::handle_sample;

fn main() -> Result<()> {
    let cli = SampleCli::parse();
    handle_sample(&cli)
}
