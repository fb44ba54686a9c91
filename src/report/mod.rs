//! Reporting: run log sinks, run summary and end-of-run notification.

pub mod notify;
pub mod run_log;

pub use notify::{Notifier, WebhookNotifier, notify_url_from_env};
pub use run_log::RunLog;

use crate::types::{NotifyStatus, RunSummary};

/// Message sent to the notification endpoint.
pub fn summary_message(summary: &RunSummary, input_dir: &std::path::Path) -> String {
    let mut msg = format!(
        "Gaussian log parsing completed. Processed {} files in {}: {} succeeded, {} failed, {:.1}s elapsed.",
        summary.discovered,
        input_dir.display(),
        summary.succeeded,
        summary.failed,
        summary.elapsed.as_secs_f64()
    );
    if summary.cancelled {
        msg.push_str(" Run was cancelled.");
    }
    msg
}

/// Send the summary if a notifier is configured. Failures are logged, never returned.
pub fn send_notification(
    notifier: Option<&dyn Notifier>,
    message: &str,
    log: &RunLog,
) -> NotifyStatus {
    let Some(notifier) = notifier else {
        log.info(format!(
            "{} not set, skipping notification",
            crate::utils::config::NOTIFY_URL_ENV
        ));
        return NotifyStatus::NotConfigured;
    };
    match notifier.notify(message) {
        Ok(()) => {
            log.info("Notification sent successfully");
            NotifyStatus::Sent
        }
        Err(e) => {
            log.error(format!("Failed to send notification: {}", e));
            NotifyStatus::Failed(e.to_string())
        }
    }
}
