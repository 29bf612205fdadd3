//! Generative-text client: posts a prompt, returns the first candidate's text.

use super::{SuggestionError, SuggestionSource};
use crate::config::SuggestionsConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    /// Build from config. Returns `None` when suggestions are disabled, the
    /// API key variable is unset, or the HTTP client cannot be built.
    pub fn from_config(config: &SuggestionsConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(k) if !k.trim().is_empty() => k,
            _ => {
                warn!(var = %config.api_key_env, "suggestion API key not set; suggestions disabled");
                return None;
            }
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .ok()?;
        Some(Self::new(client, &config.endpoint, &config.model, api_key))
    }

    pub fn new(
        client: reqwest::blocking::Client,
        endpoint: &str,
        model: &str,
        api_key: String,
    ) -> Self {
        let url = format!(
            "{}/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            model
        );
        Self {
            client,
            url,
            api_key,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SuggestionSource for GeminiClient {
    fn suggest(&self, prompt: &str) -> Result<String, SuggestionError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let res = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| SuggestionError::Http(e.to_string()))?;
        if !res.status().is_success() {
            return Err(SuggestionError::Status(res.status().as_u16()));
        }
        let parsed: GenerateResponse = res.json().map_err(|_| SuggestionError::MalformedResponse)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(SuggestionError::MalformedResponse)?;
        debug!(chars = text.len(), "suggestion received");
        Ok(text)
    }
}
