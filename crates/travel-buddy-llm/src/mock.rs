//! Offline backend for demos and tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use travel_buddy_core::error::{BuddyError, Result};

use crate::backend::{GenerationParams, ModelBackend};

enum Mode {
    /// Answer by quoting the last user line of the prompt.
    Echo,
    /// Pop canned responses in order, then fall back to echo.
    Scripted(VecDeque<String>),
    /// Fail every call as if the service were down.
    Unavailable(String),
}

/// Deterministic [`ModelBackend`] that never touches the network.
///
/// Every prompt it receives is recorded and can be inspected with
/// [`MockBackend::prompts`].
pub struct MockBackend {
    mode: Mutex<Mode>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn echo() -> Self {
        Self::with_mode(Mode::Echo)
    }

    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(Mode::Scripted(
            responses.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::with_mode(Mode::Unavailable(reason.into()))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode: Mutex::new(mode),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

fn echo_reply(prompt: &str) -> String {
    let question = prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("User: "))
        .unwrap_or(prompt)
        .trim();
    format!("(offline) You asked: {}", question)
}

#[async_trait]
impl ModelBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|e| BuddyError::Backend(format!("mock lock poisoned: {}", e)))?
            .push(prompt.to_string());

        let mut mode = self
            .mode
            .lock()
            .map_err(|e| BuddyError::Backend(format!("mock lock poisoned: {}", e)))?;
        match &mut *mode {
            Mode::Echo => Ok(echo_reply(prompt)),
            Mode::Scripted(queue) => Ok(queue.pop_front().unwrap_or_else(|| echo_reply(prompt))),
            Mode::Unavailable(reason) => Err(BuddyError::BackendUnavailable(reason.clone())),
        }
    }

    async fn health_check(&self) -> Result<()> {
        let mode = self
            .mode
            .lock()
            .map_err(|e| BuddyError::Backend(format!("mock lock poisoned: {}", e)))?;
        match &*mode {
            Mode::Unavailable(reason) => Err(BuddyError::BackendUnavailable(reason.clone())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_quotes_last_user_line() {
        let backend = MockBackend::echo();
        let prompt = "System: be helpful\n\nUser: earlier\nAssistant: ok\n\nUser: Where in May?\n\nAssistant:";
        let out = backend
            .generate(prompt, &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(out, "(offline) You asked: Where in May?");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_then_echo() {
        let backend = MockBackend::scripted(["first", "second"]);
        let params = GenerationParams::default();
        assert_eq!(backend.generate("User: a", &params).await.unwrap(), "first");
        assert_eq!(backend.generate("User: b", &params).await.unwrap(), "second");
        assert_eq!(
            backend.generate("User: c", &params).await.unwrap(),
            "(offline) You asked: c"
        );
        assert_eq!(backend.prompts(), vec!["User: a", "User: b", "User: c"]);
    }

    #[tokio::test]
    async fn test_unavailable_fails_and_records() {
        let backend = MockBackend::unavailable("connection refused");
        let err = backend
            .generate("User: hi", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(err.is_backend());
        assert!(backend.health_check().await.is_err());
        assert_eq!(backend.last_prompt().as_deref(), Some("User: hi"));
    }
}
