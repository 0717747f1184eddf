//! Text-generation backends used by judges.
//!
//! A backend receives a fully built prompt plus the JSON schema of the
//! structured answer and returns the raw response text. Parsing and
//! validation happen in the judge.

pub mod openai;
pub mod scripted;

use crate::error::Result;
use async_trait::async_trait;

pub use openai::OpenAiBackend;
pub use scripted::ScriptedBackend;

/// One structured-output request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema: serde_json::Value,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Run one completion and return the raw message content
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Short identifier used in logs
    fn name(&self) -> &str;
}
