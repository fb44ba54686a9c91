//! CLI command handlers: batch run (default binary) and single-file sample.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::arg_parser::{Cli, SampleCli};
use crate::engine::tools::sample_output_path;
use crate::extract::{Extractor, GaussianExtractor};
use crate::pipeline::run_batch;
use crate::report::{Notifier, WebhookNotifier, notify_url_from_env};
use crate::utils::config::Defaults;
use crate::utils::settings_toml::{SettingsSection, SettingsToml};
use crate::utils::{load_settings_toml, setup_logging, write_json_atomic};
use crate::{Opts, OutputMode};

/// Resolve options: built-in defaults < settings file < command line.
pub fn build_opts(cli: &Cli, file: Option<&SettingsToml>, notify_url: Option<String>) -> Opts {
    let empty = SettingsSection::default();
    let file = file.map_or(&empty, |f| &f.settings);

    let out_dir = cli
        .out_dir
        .clone()
        .or_else(|| file.out_dir.clone())
        .unwrap_or_else(|| Defaults::OUTPUT_DIR.into());
    // An explicit -o always means combined mode.
    let separate = cli.output.is_none() && cli.separate.or(file.separate).unwrap_or(false);
    let mode = if separate {
        OutputMode::Separate(out_dir)
    } else {
        OutputMode::Combined(
            cli.output
                .clone()
                .or_else(|| file.output.clone())
                .unwrap_or_else(|| out_dir.join(Defaults::COMBINED_FILENAME)),
        )
    };

    Opts {
        input_dir: cli.input_dir.clone(),
        pattern: cli
            .pattern
            .clone()
            .or_else(|| file.pattern.clone())
            .unwrap_or_else(|| Defaults::PATTERN.to_string()),
        mode,
        jobs: cli.jobs.or(file.jobs),
        info_log: cli
            .info_log
            .clone()
            .or_else(|| file.info_log.clone())
            .unwrap_or_else(|| Defaults::INFO_LOG.into()),
        error_log: cli
            .error_log
            .clone()
            .or_else(|| file.error_log.clone())
            .unwrap_or_else(|| Defaults::ERROR_LOG.into()),
        progress: !cli.quiet && file.progress.unwrap_or(true),
        verbose: cli.verbose.unwrap_or(false),
        notify_url,
    }
}

fn make_notifier(opts: &Opts) -> Option<WebhookNotifier> {
    let url = opts.notify_url.as_deref()?;
    WebhookNotifier::new(url)
        .map_err(|e| warn!("Notification disabled: {}", e))
        .ok()
}

/// Set the cancel flag. Returns true when cancellation had already been requested.
pub fn request_cancel(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

/// Run a batch. Exit status is non-zero only for fatal errors or cancellation.
pub fn handle_run(cli: &Cli) -> Result<()> {
    setup_logging(cli.verbose.unwrap_or(false));
    let cwd = std::env::current_dir().context("read working directory")?;
    let settings = load_settings_toml(&cwd);
    let opts = build_opts(cli, settings.as_ref(), notify_url_from_env(&cwd));
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        if request_cancel(&cancel_requested_handler) {
            // Second signal exits without waiting for in-flight files.
            std::process::exit(130);
        }
        warn!("Cancelling: finishing in-flight files. Press Ctrl+C again to exit immediately");
    })
    .context("set Ctrl+C handler")?;

    let notifier = make_notifier(&opts);
    let summary = run_batch(
        &opts,
        &GaussianExtractor,
        notifier.as_ref().map(|n| n as &dyn Notifier),
        &cancel_requested,
    )?;
    println!("{}", summary);

    if summary.cancelled {
        anyhow::bail!(
            "Parsing cancelled by user; completed results were written to {}",
            summary.output.location().display()
        );
    }
    Ok(())
}

/// Parse one file and write its record. Any parse failure is an error exit.
pub fn handle_sample(cli: &SampleCli) -> Result<()> {
    setup_logging(cli.verbose);
    let out_path = cli
        .out
        .clone()
        .unwrap_or_else(|| sample_output_path(&cli.logfile));
    sample_file(&cli.logfile, &out_path, &GaussianExtractor)?;
    println!("Saved: {}", out_path.display());
    Ok(())
}

/// Extract `logfile` and write the record to `out_path`.
pub fn sample_file(logfile: &Path, out_path: &Path, extractor: &dyn Extractor) -> Result<()> {
    let record = extractor
        .extract(logfile)
        .with_context(|| format!("failed to parse {}", logfile.display()))?;
    write_json_atomic(out_path, &record)?;
    Ok(())
}
