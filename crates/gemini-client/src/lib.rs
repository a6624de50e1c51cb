use async_trait::async_trait;
use brief_core::{BriefError, MarketDataSource, NarrativeKind, RunClock, Snapshot, Topic};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub mod prompts;
mod throttle;

use throttle::Throttle;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TEMPERATURE: f64 = 0.2;
const MAX_OUTPUT_TOKENS: u32 = 1500;
const MAX_ATTEMPTS: u32 = 3;

/// Gemini `generateContent` client with Google Search grounding.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
    throttle: Throttle,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, requests_per_minute: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            model,
            client,
            throttle: Throttle::per_minute(requests_per_minute),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a request with rate limiting and exponential 429 backoff.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BriefError> {
        let request = builder.build().map_err(|e| BriefError::Api(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.throttle.wait_turn().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| BriefError::Api("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| BriefError::Fetch(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 10u64 << attempt;
            tracing::warn!(
                "Gemini 429 rate limited, waiting {}s before retry {}/{}",
                wait_secs,
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(BriefError::Api(format!("Rate limited by Gemini after {} retries", MAX_ATTEMPTS)))
    }

    /// Run one search-grounded generation and return the concatenated text.
    pub async fn generate(&self, prompt: &str, json_mode: bool) -> Result<String, BriefError> {
        let url = format!("{}/{}:generateContent", BASE_URL, self.model);
        let body = GenerateRequest::new(prompt, json_mode);

        let response = self
            .send_request(self.client.post(&url).query(&[("key", &self.api_key)]).json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(BriefError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BriefError::Parse(e.to_string()))?;

        parsed
            .text()
            .ok_or_else(|| BriefError::Api("Gemini returned no candidates".to_string()))
    }

    /// Generate and pull the JSON document out of the reply.
    pub async fn ask_json(&self, prompt: &str) -> Result<Value, BriefError> {
        let raw = self.generate(prompt, true).await?;
        extract_json(&raw)
    }
}

#[async_trait]
impl MarketDataSource for GeminiClient {
    async fn fetch_topic(&self, topic: Topic, clock: &RunClock) -> Result<Value, BriefError> {
        tracing::debug!("Fetching {}", topic.label());
        self.ask_json(&prompts::topic_prompt(topic, clock)).await
    }

    async fn narrate(
        &self,
        kind: NarrativeKind,
        context: &Snapshot,
        clock: &RunClock,
    ) -> Result<String, BriefError> {
        let prompt = match kind {
            NarrativeKind::MorningBrief => prompts::morning_brief_prompt(clock),
            NarrativeKind::IntradayUpdate => prompts::intraday_prompt(context, clock),
        };
        self.generate(&prompt, false).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Pull a JSON object or array out of model text: markdown fences are
/// stripped, then the outermost `{...}` or `[...]` span is parsed.
pub fn extract_json(raw: &str) -> Result<Value, BriefError> {
    let text = strip_fences(raw.trim());

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() || value.is_array() {
            return Ok(value);
        }
    }

    let candidates = text
        .char_indices()
        .filter_map(|(i, c)| match c {
            '{' => Some((i, '}')),
            '[' => Some((i, ']')),
            _ => None,
        });

    for (start, closer) in candidates {
        let Some(end) = text.rfind(closer) else {
            continue;
        };
        if end <= start {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
            return Ok(value);
        }
    }

    let preview: String = raw.chars().take(80).collect();
    Err(BriefError::Parse(format!("no JSON document in reply: {:?}", preview)))
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, e.g. ```json
    let rest = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    tools: Vec<Value>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn new(prompt: &str, json_mode: bool) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            tools: vec![serde_json::json!({ "google_search": {} })],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: json_mode.then(|| "application/json".to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_object() {
        let value = extract_json(r#"{"price":"22,450.50","trend":"bullish"}"#).unwrap();
        assert_eq!(value["trend"], "bullish");
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "```json\n{\"value\": \"14.2\", \"level\": \"moderate\"}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"value": "14.2", "level": "moderate"}));
    }

    #[test]
    fn test_extract_json_surrounded_by_prose() {
        let raw = "Here is the data you asked for: [{\"name\":\"Dow\",\"pct\":\"+0.4%\"}] Hope that helps.";
        let value = extract_json(raw).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["name"], "Dow");
    }

    #[test]
    fn test_extract_prefers_object_wrapping_array() {
        let raw = "Result: {\"items\": [1, 2, 3]}";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["items"], json!([1, 2, 3]));
    }

    #[test]
    fn test_extract_rejects_prose() {
        assert!(matches!(extract_json("Markets were closed today."), Err(BriefError::Parse(_))));
        assert!(extract_json("").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateRequest::new("hi", true)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["tools"][0], json!({"google_search": {}}));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1500);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let body = serde_json::to_value(GenerateRequest::new("hi", false)).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "GIFT NIFTY: "}, {"text": "flat"}]}}]
        }))
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("GIFT NIFTY: flat"));

        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.text().is_none());
    }
}
