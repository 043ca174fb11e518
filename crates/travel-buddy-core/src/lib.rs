pub mod config;
pub mod error;
pub mod types;

pub use config::{BackendKind, BuddyConfig, GenerationConfig, MemoryConfig, ModelConfig};
pub use error::{BuddyError, Result};
pub use types::*;
