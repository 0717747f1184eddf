use crate::error::{JudgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Domain-specific expectations handed to a judge alongside the answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Tool names the candidate is expected to call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_tools: Option<Vec<String>>,

    /// Parameter name to expected value or value shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_parameters: Option<serde_json::Map<String, serde_json::Value>>,

    /// Whether `expected_tools` must be called in the listed order
    #[serde(default)]
    pub tools_ordered: bool,

    /// Any further keys, rendered verbatim into prompts
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EvaluationContext {
    pub fn with_tools(tools: Vec<String>) -> Self {
        Self {
            expected_tools: Some(tools),
            ..Self::default()
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Map<String, serde_json::Value>) -> Self {
        self.expected_parameters = Some(parameters);
        self
    }

    /// True when the context names tools or parameters to check
    pub fn has_tool_expectations(&self) -> bool {
        self.expected_tools.as_ref().is_some_and(|t| !t.is_empty())
            || self
                .expected_parameters
                .as_ref()
                .is_some_and(|p| !p.is_empty())
    }
}

/// The four inputs of one judgment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Task or question posed to the candidate
    pub input_text: String,
    /// Candidate response, possibly including tool-call traces
    pub output: String,
    /// Reference answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EvaluationContext>,
}

impl EvaluationRequest {
    pub fn new(input_text: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            output: output.into(),
            expected: None,
            context: None,
        }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_text.trim().is_empty() {
            return Err(JudgeError::InvalidInput(
                "input text must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_output(&self) -> bool {
        !self.output.trim().is_empty()
    }
}
