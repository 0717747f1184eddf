//! Structured response validation.
//!
//! Turns raw backend text into a [`Verdict`] or a validation error. Nothing
//! is coerced: a boolean judge answering `"maybe"` fails here.

use crate::error::{JudgeError, Result};
use crate::score::ScoreType;
use crate::verdict::Verdict;

/// Extract the outermost JSON object from text that may carry markdown
/// fences or surrounding prose
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Validate a raw backend response against a judge's score type
pub fn parse_verdict(raw: &str, score_type: &ScoreType) -> Result<Verdict> {
    let json = extract_json_object(raw).ok_or_else(|| {
        JudgeError::Validation(format!("response contains no JSON object: {}", preview(raw)))
    })?;

    let payload: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        JudgeError::Validation(format!("failed to parse judge response JSON: {}", e))
    })?;

    let object = payload.as_object().ok_or_else(|| {
        JudgeError::Validation("judge response must be a JSON object".to_string())
    })?;

    // `passed` is the boolean field name used by older judge prompts
    let score_field = object.get("score").or_else(|| match score_type {
        ScoreType::Boolean => object.get("passed"),
        _ => None,
    });
    let score_value = score_field.ok_or_else(|| {
        JudgeError::Validation("judge response is missing the score field".to_string())
    })?;
    let score = score_type.parse(score_value)?;

    let reasoning = object
        .get("reasoning")
        .or_else(|| object.get("reason"))
        .map(reasoning_text)
        .transpose()?
        .unwrap_or_default();

    Verdict::new(score, reasoning, Some(raw.to_string()))
}

fn reasoning_text(value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(text) => Ok(text.trim().to_string()),
        serde_json::Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::trim).ok_or_else(|| {
                        JudgeError::Validation(format!("reasoning entries must be strings, got {}", item))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(parts
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("; "))
        }
        serde_json::Value::Null => Ok(String::new()),
        other => Err(JudgeError::Validation(format!(
            "reasoning must be a string, got {}",
            other
        ))),
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 80;
    if text.chars().count() > LIMIT {
        format!("{}...", text.chars().take(LIMIT).collect::<String>())
    } else {
        text.to_string()
    }
}
