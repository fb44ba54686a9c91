//! Per-run log sinks: an info file (info and above) and an error file (errors only).
//!
//! A [`RunLog`] is opened before any worker starts and closed when the run is done. Both files are
//! opened in append mode and line-buffered, so every line reaches the file as soon as it is logged.
//! Each sink has its own mutex; concurrent workers never interleave within a line. Every line is
//! also forwarded to the console logger.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::BatchError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

struct Sink {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl Sink {
    fn open(path: &Path) -> Result<Self, BatchError> {
        let to_err = |source| BatchError::LogSink {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(to_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(to_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    fn write_line(&self, line: &str) {
        // A poisoned sink still holds a usable writer.
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(w, "{line}") {
            log::debug!("{}: {}", self.path.display(), e);
        }
    }

    fn flush(&self) {
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = w.flush();
    }
}

/// Explicit logging context for one batch run.
pub struct RunLog {
    info: Sink,
    error: Sink,
}

impl RunLog {
    pub fn open(info_path: &Path, error_path: &Path) -> Result<Self, BatchError> {
        Ok(Self {
            info: Sink::open(info_path)?,
            error: Sink::open(error_path)?,
        })
    }

    pub fn info_path(&self) -> &Path {
        &self.info.path
    }

    pub fn error_path(&self) -> &Path {
        &self.error.path
    }

    pub fn info(&self, msg: impl Display) {
        let msg = msg.to_string();
        self.info.write_line(&format_line("INFO", &msg));
        log::info!("{}", msg);
    }

    /// Same as [`Self::info`] but only the file sink; keeps the console quiet under a progress bar.
    pub fn info_file_only(&self, msg: impl Display) {
        self.info.write_line(&format_line("INFO", &msg.to_string()));
    }

    pub fn warn(&self, msg: impl Display) {
        let msg = msg.to_string();
        self.info.write_line(&format_line("WARNING", &msg));
        log::warn!("{}", msg);
    }

    /// Errors go to both sinks: the info sink records everything at info and above.
    pub fn error(&self, msg: impl Display) {
        let msg = msg.to_string();
        let line = format_line("ERROR", &msg);
        self.info.write_line(&line);
        self.error.write_line(&line);
        log::error!("{}", msg);
    }

    pub fn flush(&self) {
        self.info.flush();
        self.error.flush();
    }

    /// Flush and drop both sinks.
    pub fn close(self) {
        self.flush();
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.flush();
    }
}

fn format_line(level: &str, msg: &str) -> String {
    format!(
        "{} - {} - {}",
        chrono::Local::now().format(TIMESTAMP_FORMAT),
        level,
        msg
    )
}
