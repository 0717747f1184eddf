//! Candidates: the models whose answers get judged.

use crate::backend::openai::{message_content, post_chat_completion};
use crate::config::{BackendConfig, CandidateConfig, CandidateKind};
use crate::error::{BackendErrorKind, JudgeError, Result};
use crate::fixture::Question;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to MCP tools. \
Call the tools you need to answer the question, then give a concise final answer.";

#[async_trait]
pub trait Candidate: Send + Sync {
    fn name(&self) -> &str;

    /// Produce the output to be judged for one question
    async fn answer(&self, question: &Question) -> Result<String>;
}

/// Replays the answer stored in the fixture
#[derive(Debug, Clone)]
pub struct RecordedCandidate {
    name: String,
}

impl RecordedCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Candidate for RecordedCandidate {
    fn name(&self) -> &str {
        &self.name
    }

    async fn answer(&self, question: &Question) -> Result<String> {
        Ok(question.answer.clone().unwrap_or_default())
    }
}

/// One tool of the MCP surface offered to a chat candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "empty_object_schema", alias = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

impl ToolDefinition {
    fn as_function_tool(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema,
            }
        })
    }
}

/// Load a JSON list of tool definitions
pub fn load_tools(path: &Path) -> Result<Vec<ToolDefinition>> {
    if !path.exists() {
        return Err(JudgeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| JudgeError::InvalidFixture(format!("{}: {}", path.display(), e)))
}

/// Asks an OpenAI-compatible chat model, offering the MCP tools as
/// function tools.
///
/// Tool calls are recorded in the output but not executed.
pub struct ChatCandidate {
    name: String,
    model: String,
    temperature: f32,
    system_prompt: String,
    tools: Vec<ToolDefinition>,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatCandidate {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            temperature: 0.0,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tools: Vec::new(),
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn request_body(&self, question: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": question },
            ],
            "temperature": self.temperature,
        });
        if !self.tools.is_empty() {
            body["tools"] = self
                .tools
                .iter()
                .map(ToolDefinition::as_function_tool)
                .collect();
        }
        body
    }
}

/// Render the model text followed by a trace of requested tool calls
fn render_output(response: &serde_json::Value) -> Result<String> {
    let message = response
        .pointer("/choices/0/message")
        .ok_or_else(|| {
            JudgeError::backend(
                BackendErrorKind::Malformed,
                "invalid chat completions response format",
            )
        })?;

    let mut output = message_content(response).unwrap_or_default().trim().to_string();

    let calls = message
        .get("tool_calls")
        .and_then(|c| c.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    if !calls.is_empty() {
        if !output.is_empty() {
            output.push_str("\n\n");
        }
        output.push_str("Tool calls:");
        for call in calls {
            let name = call
                .pointer("/function/name")
                .and_then(|n| n.as_str())
                .unwrap_or("<unnamed>");
            let arguments = call
                .pointer("/function/arguments")
                .and_then(|a| a.as_str())
                .unwrap_or("{}");
            let _ = write!(output, "\n- {}({})", name, arguments);
        }
    }

    Ok(output)
}

#[async_trait]
impl Candidate for ChatCandidate {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, question), fields(candidate = %self.name, model = %self.model))]
    async fn answer(&self, question: &Question) -> Result<String> {
        let response = post_chat_completion(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.request_body(&question.question),
        )
        .await?;

        let output = render_output(&response)?;
        tracing::debug!(bytes = output.len(), "candidate_answer");
        Ok(output)
    }
}

/// Build a candidate from its profile entry
pub fn build_candidate(
    config: &CandidateConfig,
    backend: &BackendConfig,
    base_dir: &Path,
) -> Result<Arc<dyn Candidate>> {
    match config.kind {
        CandidateKind::Recorded => Ok(Arc::new(RecordedCandidate::new(&config.name))),
        CandidateKind::Chat => {
            let model = config.model.as_deref().ok_or_else(|| {
                JudgeError::Configuration(format!("chat candidate '{}' needs a model", config.name))
            })?;

            let tools = match &config.tools {
                Some(path) => load_tools(&base_dir.join(path))?,
                None => Vec::new(),
            };

            let mut candidate =
                ChatCandidate::new(&config.name, model, backend.base_url(), backend.api_key()?)
                    .with_tools(tools)
                    .with_temperature(config.temperature);
            if let Some(prompt) = &config.system_prompt {
                candidate = candidate.with_system_prompt(prompt);
            }
            Ok(Arc::new(candidate))
        }
    }
}
