//! HuggingFace text-generation backend.
//!
//! Talks to either the hosted Inference API or a self-hosted
//! text-generation-inference server; both accept the same request body.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use travel_buddy_core::error::{BuddyError, Result};

use crate::backend::{http_client, map_request_error, GenerationParams, ModelBackend};

const INFERENCE_API_BASE: &str = "https://api-inference.huggingface.co/models";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    do_sample: bool,
    return_full_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

/// TGI returns an object, the Inference API a one-element array.
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Many(Vec<Generated>),
    One(Generated),
    Error { error: String },
}

pub struct HuggingFaceBackend {
    endpoint: String,
    model: String,
    api_token: Option<String>,
    http: reqwest::Client,
}

impl HuggingFaceBackend {
    /// `endpoint` may be empty, in which case the hosted Inference API URL
    /// for `model` is used.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = if endpoint.trim().is_empty() {
            format!("{}/{}", INFERENCE_API_BASE, model)
        } else {
            endpoint.trim().trim_end_matches('/').to_string()
        };
        reqwest::Url::parse(&endpoint).map_err(|e| {
            BuddyError::Config(format!("Invalid HuggingFace endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self {
            endpoint,
            model: model.to_string(),
            api_token: api_token.filter(|t| !t.trim().is_empty()),
            http: http_client(timeout)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ModelBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt, params), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let body = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                do_sample: true,
                return_full_text: false,
                seed: params.seed,
            },
        };

        let response = self
            .request(self.http.post(&self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error("huggingface", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let err = format!("huggingface returned HTTP {}: {}", status.as_u16(), detail.trim());
            // 503 means the hosted model is still loading.
            return Err(if status.as_u16() == 503 {
                BuddyError::BackendUnavailable(err)
            } else {
                BuddyError::Backend(err)
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            BuddyError::Backend(format!("huggingface sent an invalid response: {}", e))
        })?;
        let text = match parsed {
            GenerateResponse::Many(items) => items
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| BuddyError::Backend("huggingface returned no generations".into()))?,
            GenerateResponse::One(g) => g.generated_text,
            GenerateResponse::Error { error } => {
                return Err(BuddyError::Backend(format!("huggingface: {}", error)))
            }
        };
        debug!(response_len = text.len(), "HuggingFace generation complete");
        Ok(text.trim().to_string())
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .request(self.http.get(&self.endpoint))
            .send()
            .await
            .map_err(|e| map_request_error("huggingface", e))?;
        // The generate route answers GET with 405 on TGI; any HTTP answer
        // below 500 proves the server is there.
        if response.status().is_server_error() {
            Err(BuddyError::BackendUnavailable(format!(
                "huggingface health check returned HTTP {}",
                response.status().as_u16()
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer, token: Option<&str>) -> HuggingFaceBackend {
        HuggingFaceBackend::new(
            &format!("{}/generate", server.uri()),
            "HuggingFaceH4/zephyr-7b-beta",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_default_endpoint_uses_model_id() {
        let backend =
            HuggingFaceBackend::new("", "distilgpt2", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://api-inference.huggingface.co/models/distilgpt2"
        );
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let backend =
            HuggingFaceBackend::new("", "gpt2", Some("  ".into()), Duration::from_secs(5)).unwrap();
        assert!(backend.api_token.is_none());
    }

    #[tokio::test]
    async fn test_generate_array_response_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("authorization", "Bearer hf_secret"))
            .and(body_partial_json(json!({
                "inputs": "Pack for Iceland?",
                "parameters": {"max_new_tokens": 256, "return_full_text": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"generated_text": " Bring layers. "}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let out = backend_for(&server, Some("hf_secret"))
            .generate("Pack for Iceland?", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(out, "Bring layers.");
    }

    #[tokio::test]
    async fn test_generate_object_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"generated_text": "Lisbon."})),
            )
            .mount(&server)
            .await;

        let out = backend_for(&server, None)
            .generate("Where?", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(out, "Lisbon.");
    }

    #[tokio::test]
    async fn test_model_loading_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"error": "Model is loading"})),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server, None)
            .generate("Where?", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuddyError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_generation_list_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = backend_for(&server, None)
            .generate("Where?", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuddyError::Backend(_)));
    }
}
