//! Narrative adapter configuration
//!
//! The text-generation backend is configured explicitly at construction
//! rather than through module globals: every knob the adapter needs is
//! enumerated here and passed into `LlmClient::new`.

use std::time::Duration;

/// Where and how narrative requests are sent.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// Chat-completions endpoint to send narrative requests to
    pub endpoint: String,
    /// Bearer credential (or x-api-key, depending on the endpoint)
    pub api_key: String,
    /// Maximum wall-clock wait for one narrative call
    pub timeout: Duration,
    /// Which text-generation model to request
    pub model: String,
}

const DEFAULT_ENDPOINT: &str = "https://api.fireworks.ai/inference/v1/chat/completions";
const DEFAULT_MODEL: &str = "accounts/fireworks/models/llama-v3p3-70b-instruct";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl NarrativeConfig {
    pub fn new(endpoint: String, api_key: String, timeout: Duration, model: String) -> Self {
        Self {
            endpoint,
            api_key,
            timeout,
            model,
        }
    }

    /// Build a config from environment variables
    ///
    /// Required: NARRATIVE_API_KEY
    /// Optional: NARRATIVE_API_URL (defaults to Fireworks chat completions)
    /// Optional: NARRATIVE_MODEL (defaults to Llama 3.3 70B instruct)
    /// Optional: NARRATIVE_TIMEOUT_SECS (defaults to 30)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("NARRATIVE_API_KEY").ok()?;
        let endpoint =
            std::env::var("NARRATIVE_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
        let model = std::env::var("NARRATIVE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let timeout_secs = std::env::var("NARRATIVE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self {
            endpoint,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            model,
        })
    }
}
