//! Application configuration constants.
//! Defaults, file names and tuning in one place.

use std::sync::OnceLock;
use std::time::Duration;

use super::fd_limit::max_workers_by_fd_limit;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Optional settings file looked up in the working directory.
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }
}

// ---- Defaults ----

/// Built-in defaults for the batch and sample CLIs.
pub struct Defaults;

impl Defaults {
    pub const INPUT_DIR: &'static str = "./out_molecules/cid_75";
    pub const PATTERN: &'static str = "*.log";
    pub const OUTPUT_DIR: &'static str = "out_molecules_json";
    pub const COMBINED_FILENAME: &'static str = "out_molecules.json";
    pub const INFO_LOG: &'static str = "parsing_info.log";
    pub const ERROR_LOG: &'static str = "parsing_errors.log";
}

/// Suffix that replaces the input extension for per-file documents (`a.log` -> `a.cclib.json`).
pub const DOCUMENT_SUFFIX: &str = "cclib.json";

// ---- Notification ----

/// Environment variable holding the webhook URL.
pub const NOTIFY_URL_ENV: &str = "DISCORD_URL";

/// Timeout for the end-of-run webhook POST.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

// ---- Worker threads ----

/// Worker count bounds for the extraction pool.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Cap from the process FD limit, if any.
    pub fd_cap: Option<usize>,
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;

    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            fd_cap: max_workers_by_fd_limit(),
        }
    }

    /// Worker count for `file_count` files: the override (or all threads), capped by the FD limit
    /// and the number of files, never below one.
    pub fn resolve(&self, requested: Option<usize>, file_count: usize) -> usize {
        let mut n = requested.unwrap_or(self.all_threads);
        if let Some(cap) = self.fd_cap
            && cap < n
        {
            log::debug!("Capping workers {} -> {} (FD limit ~80%)", n, cap);
            n = cap;
        }
        n.min(file_count).max(Self::FLOOR_THREADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_caps_by_files_and_fds() {
        let limits = WorkerThreadLimits {
            all_threads: 16,
            fd_cap: Some(6),
        };
        assert_eq!(limits.resolve(None, 100), 6);
        assert_eq!(limits.resolve(Some(4), 100), 4);
        assert_eq!(limits.resolve(None, 3), 3);
        assert_eq!(limits.resolve(Some(0), 10), 1);
        assert_eq!(limits.resolve(None, 0), 1);
    }
}
