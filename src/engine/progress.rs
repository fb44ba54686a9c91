//! Completed-of-total tracking for the worker pool, with an optional terminal progress bar.

use kdam::{Animation, Bar, BarExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " file"
    )))
}

/// Move the bar to `n` if the lock is free. A skipped update is caught up by the next one,
/// since the position always comes from the shared counter.
pub fn sync_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.update_to(n);
    }
}

/// Shared completion counter. `advance` is called once per finished file from any worker.
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(total: usize, show_bar: bool) -> Self {
        let bar = (show_bar && total > 0).then(|| {
            create_progress_bar(ProgressBarConfig::new(
                total,
                "Processing log files",
                Animation::Classic,
            ))
        });
        Self {
            total,
            completed: AtomicUsize::new(0),
            bar,
        }
    }

    /// Counter without a bar (library use, tests).
    pub fn hidden(total: usize) -> Self {
        Self::new(total, false)
    }

    /// Record one completed file. Returns the new completed count.
    pub fn advance(&self) -> usize {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(bar) = &self.bar {
            sync_progress_bar(bar, done);
        }
        done
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_bar(&self) -> bool {
        self.bar.is_some()
    }

    /// Final blocking update so the bar ends on the true count, then move to a fresh line.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            let mut bar = bar.lock().unwrap_or_else(|e| e.into_inner());
            let _ = bar.update_to(self.completed());
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_advances_are_all_counted() {
        let progress = Progress::hidden(8 * 250);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..250 {
                        progress.advance();
                    }
                });
            }
        });
        assert_eq!(progress.completed(), progress.total());
    }
}
