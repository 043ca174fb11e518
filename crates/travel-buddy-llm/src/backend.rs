//! Model backend trait and construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use travel_buddy_core::config::{BackendKind, GenerationConfig, ModelConfig};
use travel_buddy_core::error::{BuddyError, Result};

use crate::huggingface::HuggingFaceBackend;
use crate::mock::MockBackend;
use crate::ollama::OllamaBackend;

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            seed: config.seed,
        }
    }
}

/// A language model that turns a prompt into a completion.
///
/// Calls are one-shot: no streaming, no retries. Transport failures map to
/// [`BuddyError::BackendUnavailable`], everything else the service rejects
/// maps to [`BuddyError::Backend`].
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short backend name for logs and `--verbose` output.
    fn name(&self) -> &str;

    fn model_id(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> Result<()>;
}

/// Build the backend selected by `config`.
pub fn build_backend(config: &ModelConfig) -> Result<Arc<dyn ModelBackend>> {
    let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
    let backend: Arc<dyn ModelBackend> = match config.backend {
        BackendKind::Ollama => Arc::new(OllamaBackend::new(
            &config.ollama_host,
            &config.model_id,
            timeout,
        )?),
        BackendKind::Huggingface => {
            if config.device != "cpu" {
                info!(
                    device = %config.device,
                    "Device hint is handled by the serving endpoint"
                );
            }
            Arc::new(HuggingFaceBackend::new(
                &config.hf_endpoint,
                &config.model_id,
                config.hf_api_token.clone(),
                timeout,
            )?)
        }
        BackendKind::Mock => Arc::new(MockBackend::echo()),
    };
    info!(
        backend = backend.name(),
        model = backend.model_id(),
        "Model backend ready"
    );
    Ok(backend)
}

/// Shared reqwest client construction for the HTTP backends.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BuddyError::Backend(format!("Failed to build HTTP client: {}", e)))
}

/// Classify a transport error from reqwest.
pub(crate) fn map_request_error(backend: &str, err: reqwest::Error) -> BuddyError {
    if err.is_connect() || err.is_timeout() {
        BuddyError::BackendUnavailable(format!("{}: {}", backend, err))
    } else {
        BuddyError::Backend(format!("{}: {}", backend, err))
    }
}
