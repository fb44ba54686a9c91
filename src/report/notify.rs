//! End-of-run notification: one webhook POST with the run summary.

use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::utils::config::{NOTIFY_TIMEOUT, NOTIFY_URL_ENV};

/// Something that can deliver a one-line summary message.
pub trait Notifier {
    fn notify(&self, message: &str) -> Result<(), DeliveryError>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": message}` as JSON to a webhook URL (Discord-compatible).
pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .send()?;
        let status = response.status();
        if status.is_success() {
            debug!("Notification delivered ({})", status);
            Ok(())
        } else {
            Err(DeliveryError::Status(status.as_u16()))
        }
    }
}

/// Webhook URL from the environment, then from `.env` in `dir`. Blank values count as unset.
pub fn notify_url_from_env(dir: &Path) -> Option<String> {
    let read = || {
        std::env::var(NOTIFY_URL_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    if let Some(url) = read() {
        return Some(url);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        return read();
    }
    None
}
