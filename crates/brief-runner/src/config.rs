use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefConfig {
    // Gemini
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_rate_limit: usize, // requests per minute

    // Persistence
    pub snapshot_path: PathBuf,

    // Push channels
    pub broadcast_enabled: bool,
    pub dashboard_url: Option<String>,
}

impl BriefConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            gemini_api_key: env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            gemini_rate_limit: env::var("GEMINI_RATE_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("GEMINI_RATE_LIMIT must be a whole number")?,

            snapshot_path: env::var("SNAPSHOT_PATH")
                .unwrap_or_else(|_| "data.json".to_string())
                .into(),

            broadcast_enabled: env::var("BROADCAST_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("BROADCAST_ENABLED must be true or false")?,
            dashboard_url: env::var("DASHBOARD_URL").ok().filter(|s| !s.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.gemini_api_key.trim().is_empty() {
            bail!("GEMINI_API_KEY is empty");
        }
        if self.gemini_rate_limit == 0 {
            bail!("GEMINI_RATE_LIMIT must be at least 1");
        }
        if self.snapshot_path.as_os_str().is_empty() {
            bail!("SNAPSHOT_PATH is empty");
        }
        Ok(())
    }
}
