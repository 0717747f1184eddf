//! Prompt-building strategies.
//!
//! A judge is generic over how it phrases the evaluation. The MCP rubric is
//! one strategy among others rather than a special kind of judge: swapping
//! the rubric changes the prompt text, never the judge contract.

use crate::judge::types::{EvaluationContext, EvaluationRequest};
use crate::score::ScoreType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub trait Rubric: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn system_prompt(&self) -> String;

    /// Build the user prompt. Must be deterministic for identical inputs.
    fn user_prompt(&self, request: &EvaluationRequest, score_type: &ScoreType) -> String;
}

/// Rubric selector used in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RubricKind {
    General,
    #[default]
    Mcp,
}

impl RubricKind {
    pub fn build(self) -> Arc<dyn Rubric> {
        match self {
            RubricKind::General => Arc::new(GeneralRubric),
            RubricKind::Mcp => Arc::new(McpRubric),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are an expert evaluator. Judge the candidate answer strictly \
against the stated criteria. Return your evaluation as a JSON object only.";

/// Question/answer evaluation without tool-specific criteria
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralRubric;

impl Rubric for GeneralRubric {
    fn name(&self) -> &str {
        "general"
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn user_prompt(&self, request: &EvaluationRequest, score_type: &ScoreType) -> String {
        format!(
            r#"Evaluate whether the generated answer correctly addresses the question.

# Question
{}

# Generated Answer
{}

# Reference Answer
{}

# Context
{}

# Criteria
1. Does the generated answer accurately address the question?
2. Is the answer factually consistent with the reference answer and context?

{}"#,
            request.input_text.trim(),
            request.output.trim(),
            render_expected(request.expected.as_deref()),
            render_context(request.context.as_ref()),
            response_format(score_type)
        )
    }
}

/// Tool-usage correctness for MCP agents
#[derive(Debug, Clone, Copy, Default)]
pub struct McpRubric;

impl McpRubric {
    fn tool_section(context: &EvaluationContext) -> String {
        let tools = match context.expected_tools.as_deref() {
            Some(tools) if !tools.is_empty() => {
                let order = if context.tools_ordered {
                    "in this order"
                } else {
                    "in any order"
                };
                format!("{} ({})", tools.join(", "), order)
            }
            _ => "(none specified)".to_string(),
        };

        let parameters = match &context.expected_parameters {
            Some(params) if !params.is_empty() => params
                .iter()
                .map(|(name, value)| format!("- {}: {}", name, value))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => "(none specified)".to_string(),
        };

        format!(
            "# Expected MCP Tools\n{}\n\n# Expected Parameters\n{}",
            tools, parameters
        )
    }
}

impl Rubric for McpRubric {
    fn name(&self) -> &str {
        "mcp"
    }

    fn system_prompt(&self) -> String {
        SYSTEM_PROMPT.to_string()
    }

    fn user_prompt(&self, request: &EvaluationRequest, score_type: &ScoreType) -> String {
        let context = request
            .context
            .as_ref()
            .filter(|c| c.has_tool_expectations());

        let (expectations, criteria) = match context {
            Some(context) => (
                Self::tool_section(context),
                "1. Does the generated answer accurately address the question?\n\
                 2. Are the expected MCP tools being used correctly?\n\
                 3. Are the tool parameters used appropriately?\n\
                 4. Is the answer factually consistent with the reference answer?",
            ),
            None => (
                "# Expected MCP Tools\n(none specified)".to_string(),
                "No tool expectations were given. Compare the generated answer verbatim \
                 against the reference answer: it passes only if it states the same facts.",
            ),
        };

        format!(
            r#"You are evaluating whether a generated answer correctly addresses a question and uses the expected MCP tools with proper parameters.

# Question
{}

# Generated Answer (with tool calls)
{}

# Reference Answer
{}

{}

# Criteria
{}

{}"#,
            request.input_text.trim(),
            request.output.trim(),
            render_expected(request.expected.as_deref()),
            expectations,
            criteria,
            response_format(score_type)
        )
    }
}

fn render_expected(expected: Option<&str>) -> &str {
    expected
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or("(no reference answer)")
}

/// Render context keys in sorted order
fn render_context(context: Option<&EvaluationContext>) -> String {
    let entries: BTreeMap<String, serde_json::Value> =
        match context.and_then(|c| serde_json::to_value(c).ok()) {
            Some(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };

    if entries.is_empty() {
        return "(none)".to_string();
    }

    entries
        .iter()
        .map(|(key, value)| format!("- {}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn response_format(score_type: &ScoreType) -> String {
    format!(
        r#"# Required Response Format
Return JSON with this exact structure:
{{
  {},
  "reasoning": "<why you gave this score>"
}}

Provide JSON only, no additional text."#,
        score_type.instructions()
    )
}

/// Substitute `{question}`, `{output}`, `{expected}`, `{context}` and
/// `{score_instructions}` in a custom template.
///
/// The template is scanned once; substituted values are never re-scanned,
/// so placeholder text inside a question or answer stays verbatim.
/// Unknown `{...}` sequences are left as written.
pub fn render_template(
    template: &str,
    request: &EvaluationRequest,
    score_type: &ScoreType,
) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match placeholder_value(candidate, request, score_type) {
            Some((consumed, value)) => {
                rendered.push_str(&value);
                rest = &candidate[consumed..];
            }
            None => {
                rendered.push('{');
                rest = &candidate[1..];
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Value for the placeholder at the start of `text`, with its byte length
fn placeholder_value(
    text: &str,
    request: &EvaluationRequest,
    score_type: &ScoreType,
) -> Option<(usize, String)> {
    let close = text.find('}')?;
    let value = match &text[1..close] {
        "question" => request.input_text.trim().to_string(),
        "output" => request.output.trim().to_string(),
        "expected" => render_expected(request.expected.as_deref()).to_string(),
        "context" => render_context(request.context.as_ref()),
        "score_instructions" => score_type.instructions(),
        _ => return None,
    };
    Some((close + 1, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcp_request() -> EvaluationRequest {
        let mut params = serde_json::Map::new();
        params.insert("path".to_string(), serde_json::json!("/some/directory"));
        EvaluationRequest::new(
            "How do I list files in a directory?",
            "You can use the `ls` command to list files in a directory.",
        )
        .with_expected("Use the `ls` command or the file browser tool.")
        .with_context(EvaluationContext::with_tools(vec!["file_browser".into()]).with_parameters(params))
    }

    #[test]
    fn test_mcp_prompt_includes_tool_expectations() {
        let prompt = McpRubric.user_prompt(&mcp_request(), &ScoreType::Boolean);

        assert!(prompt.contains("How do I list files in a directory?"));
        assert!(prompt.contains("file_browser (in any order)"));
        assert!(prompt.contains("- path: \"/some/directory\""));
        assert!(prompt.contains("Are the expected MCP tools being used correctly?"));
        assert!(prompt.contains("\"score\": true if the answer passes"));
    }

    #[test]
    fn test_mcp_prompt_ordered_tools() {
        let mut request = mcp_request();
        if let Some(context) = request.context.as_mut() {
            context.tools_ordered = true;
            context.expected_tools = Some(vec!["search".into(), "fetch".into()]);
        }
        let prompt = McpRubric.user_prompt(&request, &ScoreType::Likert);
        assert!(prompt.contains("search, fetch (in this order)"));
    }

    #[test]
    fn test_mcp_prompt_falls_back_to_verbatim_comparison() {
        let request = EvaluationRequest::new("What is 2+2?", "4").with_expected("4");
        let prompt = McpRubric.user_prompt(&request, &ScoreType::Boolean);

        assert!(prompt.contains("Compare the generated answer verbatim"));
        assert!(!prompt.contains("Are the tool parameters used appropriately?"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let request = mcp_request();
        let first = GeneralRubric.user_prompt(&request, &ScoreType::numerical());
        let second = GeneralRubric.user_prompt(&request, &ScoreType::numerical());
        assert_eq!(first, second);
    }

    #[test]
    fn test_general_prompt_renders_context_sorted() {
        let prompt = GeneralRubric.user_prompt(&mcp_request(), &ScoreType::Boolean);
        let params = prompt.find("- expected_parameters:").unwrap();
        let tools = prompt.find("- expected_tools:").unwrap();
        assert!(params < tools);
    }

    #[test]
    fn test_render_template_placeholders() {
        let rendered = render_template(
            "Q={question} A={output} R={expected} S={score_instructions}",
            &EvaluationRequest::new("q", "a"),
            &ScoreType::Likert,
        );
        assert!(rendered.starts_with("Q=q A=a R=(no reference answer) S=\"score\": one of"));
    }

    #[test]
    fn test_render_template_keeps_placeholders_inside_values() {
        let request = EvaluationRequest::new("Explain {context} and {output}", "print(f\"{expected}\")")
            .with_expected("reference answer");

        let rendered = render_template("Q={question} OUT={output} REF={expected}", &request, &ScoreType::Boolean);

        assert_eq!(
            rendered,
            "Q=Explain {context} and {output} OUT=print(f\"{expected}\") REF=reference answer"
        );
    }

    #[test]
    fn test_render_template_leaves_unknown_braces() {
        let rendered = render_template(
            "{\"score\": {nope}} {output}",
            &EvaluationRequest::new("q", "a"),
            &ScoreType::Boolean,
        );
        assert_eq!(rendered, "{\"score\": {nope}} a");
    }
}
