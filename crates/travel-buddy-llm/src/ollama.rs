//! Ollama backend using the native `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use travel_buddy_core::error::{BuddyError, Result};

use crate::backend::{http_client, map_request_error, GenerationParams, ModelBackend};

/// Strip trailing slashes and an OpenAI-compat `/v1` suffix.
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/').to_string();
    if url.ends_with("/v1") {
        url.truncate(url.len() - 3);
    }
    url
}

fn is_local_url(url: &reqwest::Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => true,
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaBackend {
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(host: &str, model: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(host);
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| BuddyError::Config(format!("Invalid Ollama host '{}': {}", host, e)))?;
        if !is_local_url(&parsed) {
            warn!(host = %base_url, "OLLAMA_HOST points to a non-local address");
        }
        Ok(Self {
            base_url,
            model: model.to_string(),
            http: http_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt, params), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: params.max_new_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                seed: params.seed,
            },
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error("ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BuddyError::Backend(format!(
                "ollama returned HTTP {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BuddyError::Backend(format!("ollama sent an invalid response: {}", e)))?;
        debug!(response_len = parsed.response.len(), "Ollama generation complete");
        Ok(parsed.response.trim().to_string())
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| map_request_error("ollama", e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(BuddyError::BackendUnavailable(format!(
                "ollama health check returned HTTP {}",
                response.status().as_u16()
            )))
        }
    }
}
