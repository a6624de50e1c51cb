use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::templates::TelegramTemplate;
use crate::{BriefDigest, NotificationChannel, NotificationError};

const API_BASE: &str = "https://api.telegram.org";

/// Bot API `sendMessage` notifier for a single chat.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", API_BASE, self.bot_token)
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    async fn send(&self, digest: &BriefDigest) -> Result<(), NotificationError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": TelegramTemplate::render(digest),
            "parse_mode": "HTML",
            "disable_web_page_preview": false,
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Telegram(e.to_string()))?;

        let status = response.status();
        let body: BotResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Telegram(format!("HTTP {}: {}", status, e)))?;

        if !body.ok {
            return Err(NotificationError::Telegram(
                body.description.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
