//! Travel Buddy LLM crate - language model backends.
//!
//! - `OllamaBackend` talks to an Ollama server (`/api/generate`).
//! - `HuggingFaceBackend` talks to the Inference API or a TGI server.
//! - `MockBackend` answers offline, for demos and tests.

pub mod backend;
pub mod huggingface;
pub mod mock;
pub mod ollama;

pub use backend::{build_backend, GenerationParams, ModelBackend};
pub use huggingface::HuggingFaceBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
