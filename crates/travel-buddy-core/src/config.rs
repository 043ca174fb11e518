use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BuddyError, Result};

/// Top-level configuration for the travel-buddy CLI.
///
/// Loaded from `~/.travel-buddy/config.toml` by default, then overlaid with
/// environment variables (see [`BuddyConfig::apply_env_overrides`]) and
/// finally with command-line flags by the binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuddyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl BuddyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BuddyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BuddyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup.
    ///
    /// Values that fail to parse are skipped with a warning so that a typo
    /// in `.env` never prevents startup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOG_LEVEL") {
            self.general.log_level = v;
        }

        if let Some(v) = lookup("LLM_BACKEND") {
            set_parsed(&mut self.model.backend, "LLM_BACKEND", &v);
        }
        for key in ["MODEL_ID", "OLLAMA_MODEL", "HF_MODEL_ID"] {
            if let Some(v) = lookup(key) {
                self.model.model_id = v;
                break;
            }
        }
        if let Some(v) = lookup("HF_DEVICE") {
            self.model.device = v;
        }
        if let Some(v) = lookup("OLLAMA_HOST") {
            self.model.ollama_host = v;
        }
        if let Some(v) = lookup("HF_ENDPOINT") {
            self.model.hf_endpoint = v;
        }
        if let Some(v) = lookup("HF_API_TOKEN") {
            self.model.hf_api_token = Some(v);
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            set_parsed(&mut self.model.request_timeout_secs, "REQUEST_TIMEOUT_SECS", &v);
        }

        if let Some(v) = lookup("MAX_NEW_TOKENS") {
            set_parsed(&mut self.generation.max_new_tokens, "MAX_NEW_TOKENS", &v);
        }
        if let Some(v) = lookup("TEMPERATURE") {
            set_parsed(&mut self.generation.temperature, "TEMPERATURE", &v);
        }
        if let Some(v) = lookup("TOP_P") {
            set_parsed(&mut self.generation.top_p, "TOP_P", &v);
        }
        if let Some(v) = lookup("TOP_K") {
            set_parsed(&mut self.generation.top_k, "TOP_K", &v);
        }
        if let Some(v) = lookup("SEED") {
            match v.trim().parse::<u64>() {
                Ok(seed) => self.generation.seed = Some(seed),
                Err(_) => warn!(key = "SEED", value = %v, "Ignoring unparseable override"),
            }
        }

        if let Some(v) = lookup("MEMORY_STORAGE_PATH") {
            self.memory.storage_path = v;
        }
        if let Some(v) = lookup("MAX_CONTEXT_TURNS") {
            set_parsed(&mut self.memory.max_context_turns, "MAX_CONTEXT_TURNS", &v);
        }
        if let Some(v) = lookup("MAX_RELEVANT_MEMORIES") {
            set_parsed(
                &mut self.memory.max_relevant_memories,
                "MAX_RELEVANT_MEMORIES",
                &v,
            );
        }
        if let Some(v) = lookup("ENABLE_MEMORY") {
            set_flag(&mut self.memory.enable_memory, "ENABLE_MEMORY", &v);
        }
        if let Some(v) = lookup("CONVERSATION_MODE") {
            set_flag(&mut self.memory.conversation_mode, "CONVERSATION_MODE", &v);
        }
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "Ignoring unparseable override"),
    }
}

fn set_flag(slot: &mut bool, key: &str, value: &str) {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => *slot = true,
        "0" | "false" | "no" | "off" => *slot = false,
        _ => warn!(key, value, "Ignoring unparseable override"),
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Which language-model service answers prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// A local or remote Ollama server.
    #[default]
    Ollama,
    /// A HuggingFace text-generation endpoint (Inference API or TGI).
    #[serde(alias = "hf")]
    Huggingface,
    /// Offline echo backend, useful for demos and tests.
    Mock,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Ollama => "ollama",
            BackendKind::Huggingface => "huggingface",
            BackendKind::Mock => "mock",
        })
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "huggingface" | "hf" => Ok(BackendKind::Huggingface),
            "mock" => Ok(BackendKind::Mock),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Model backend selection and connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: BackendKind,
    /// Model name (Ollama tag or HuggingFace repo id).
    pub model_id: String,
    /// Device hint forwarded to the backend: "cpu", "cuda", "auto".
    pub device: String,
    pub ollama_host: String,
    /// Full URL of the text-generation endpoint. When empty, the public
    /// Inference API URL for `model_id` is used.
    pub hf_endpoint: String,
    pub hf_api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            model_id: "llama3.2".to_string(),
            device: "cpu".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            hf_endpoint: String::new(),
            hf_api_token: None,
            request_timeout_secs: 120,
        }
    }
}

/// Sampling parameters passed with every generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.5,
            top_p: 0.95,
            top_k: 50,
            seed: None,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Path of the JSON session store.
    pub storage_path: String,
    /// Most recent turns included in a prompt.
    pub max_context_turns: usize,
    /// Most preferences included in a prompt.
    pub max_relevant_memories: usize,
    /// Read and write the session store at all.
    pub enable_memory: bool,
    /// Include prior turns in prompts (preferences are included regardless).
    pub conversation_mode: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            storage_path: "memory_store.json".to_string(),
            max_context_turns: 10,
            max_relevant_memories: 5,
            enable_memory: true,
            conversation_mode: true,
        }
    }
}
