//! LLM text generation.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::Result;

/// A backend that turns a prompt into free-form text.
///
/// Implementations own their credential; constructing one implies the
/// credential is configured.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Returns the model's text response to `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
