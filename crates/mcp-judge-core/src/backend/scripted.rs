//! Deterministic in-process backend.
//!
//! Replays a queue of canned replies. Used by unit tests and by the CLI's
//! `--dry-run` mode, where no network call may happen.

use super::{Backend, CompletionRequest};
use crate::error::{BackendErrorKind, JudgeError, Result};
use crate::score::{Score, ScoreType};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Content(String),
    Error(BackendErrorKind, String),
    /// Never completes; exercises timeouts and cancellation
    Hang,
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that answers every call with the same content
    pub fn always(content: impl Into<String>) -> Self {
        Self::new().otherwise(ScriptedReply::Content(content.into()))
    }

    /// Backend for dry runs: every call yields the type's failing score
    pub fn dry_run(score_type: &ScoreType) -> Self {
        let score = match score_type.failing() {
            Score::Boolean(value) => serde_json::json!(value),
            Score::Numerical(value) => serde_json::json!(value),
            Score::Likert(level) => serde_json::json!(level.as_str()),
        };
        Self::always(
            serde_json::json!({
                "score": score,
                "reasoning": "dry run: no backend was called",
            })
            .to_string(),
        )
    }

    pub fn reply(self, content: impl Into<String>) -> Self {
        self.push(ScriptedReply::Content(content.into()))
    }

    pub fn fail(self, kind: BackendErrorKind, message: impl Into<String>) -> Self {
        self.push(ScriptedReply::Error(kind, message.into()))
    }

    pub fn hang(self) -> Self {
        self.push(ScriptedReply::Hang)
    }

    /// Reply used once the queue is exhausted
    pub fn otherwise(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, reply: ScriptedReply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    /// Number of completed or attempted calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        let queued = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        queued.or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply() {
            Some(ScriptedReply::Content(content)) => Ok(content),
            Some(ScriptedReply::Error(kind, message)) => Err(JudgeError::backend(kind, message)),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Err(JudgeError::backend(
                BackendErrorKind::Internal,
                "scripted backend has no reply left",
            )),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".to_string(),
            temperature: 0.0,
            system_prompt: String::new(),
            user_prompt: "p".to_string(),
            schema: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_replies_in_order_then_fallback() {
        let backend = ScriptedBackend::new()
            .reply("first")
            .fail(BackendErrorKind::RateLimit, "slow down")
            .otherwise(ScriptedReply::Content("again".to_string()));

        assert_eq!(backend.complete(&request()).await.unwrap(), "first");
        assert!(backend.complete(&request()).await.is_err());
        assert_eq!(backend.complete(&request()).await.unwrap(), "again");
        assert_eq!(backend.complete(&request()).await.unwrap(), "again");
        assert_eq!(backend.calls(), 4);
        assert_eq!(backend.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_queue_errors() {
        let backend = ScriptedBackend::new();
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(err.is_judge_failure());
    }

    #[tokio::test]
    async fn test_dry_run_reply_is_valid_json() {
        let backend = ScriptedBackend::dry_run(&ScoreType::Likert);
        let content = backend.complete(&request()).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["score"], "poor");
    }
}
