mod digest;
mod smtp;
mod telegram;
mod templates;

pub use digest::{BriefDigest, DigestHeadline};
pub use smtp::SmtpNotifier;
pub use telegram::TelegramNotifier;
pub use templates::{EmailTemplate, TelegramTemplate};

use async_trait::async_trait;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, digest: &BriefDigest) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Telegram error: {0}")]
    Telegram(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_to: Vec<String>,
    pub smtp_tls: SmtpTls,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl SmtpTls {
    fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "tls" => SmtpTls::Tls,
            "none" => SmtpTls::None,
            _ => SmtpTls::StartTls,
        }
    }
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

fn split_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self {
            smtp_host: non_empty("SMTP_HOST"),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            smtp_username: non_empty("SMTP_USERNAME"),
            smtp_password: non_empty("SMTP_PASSWORD"),
            smtp_from: non_empty("SMTP_FROM_ADDRESS"),
            smtp_to: split_recipients(&std::env::var("NOTIFICATION_EMAIL_TO").unwrap_or_default()),
            smtp_tls: SmtpTls::parse(&std::env::var("SMTP_TLS").unwrap_or_default()),
            telegram_bot_token: non_empty("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: non_empty("TELEGRAM_CHAT_ID"),
        }
    }

    fn smtp_ready(&self) -> bool {
        self.smtp_host.is_some() && self.smtp_from.is_some() && !self.smtp_to.is_empty()
    }
}

/// Dispatches a digest to every configured channel.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.smtp_ready() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!(
                        "Email notifications enabled (SMTP -> {} recipients)",
                        config.smtp_to.len()
                    );
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                }
            }
        }

        if let (Some(token), Some(chat_id)) =
            (&config.telegram_bot_token, &config.telegram_chat_id)
        {
            channels.push(Box::new(TelegramNotifier::new(token.clone(), chat_id.clone())));
            tracing::info!("Telegram notifications enabled");
        }

        if channels.is_empty() {
            tracing::info!(
                "No notification channels configured (set SMTP_HOST or TELEGRAM_BOT_TOKEN)"
            );
        }

        Self { channels }
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Send to every channel in turn. Returns how many succeeded; a failing
    /// channel is logged and does not stop the others.
    pub async fn broadcast(&self, digest: &BriefDigest) -> usize {
        let mut delivered = 0;
        for channel in &self.channels {
            match channel.send(digest).await {
                Ok(()) => {
                    tracing::info!("Sent brief via {}", channel.name());
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to send brief via {}: {}", channel.name(), e)
                }
            }
        }
        delivered
    }
}
