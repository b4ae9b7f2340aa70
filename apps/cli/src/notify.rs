//! Outcome notifications — fire-and-forget messages to a Telegram chat.
//! Delivery failures are the caller's to log; they never fail a run.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::RunError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), RunError>;
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    send_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, bot_token: &str, chat_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            send_url: format!("{api_url}/bot{bot_token}/sendMessage"),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), RunError> {
        let response = self
            .client
            .get(&self.send_url)
            .query(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()
            .await
            .map_err(|e| RunError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RunError::Notification(format!(
                "telegram returned status {status}"
            )));
        }
        Ok(())
    }
}
