//! Question fixtures and question selection.

use crate::error::{JudgeError, Result};
use crate::judge::{EvaluationContext, EvaluationRequest};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// One benchmark question with its tool-usage expectations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,

    #[serde(default)]
    pub expected_tools: Vec<String>,

    #[serde(default)]
    pub expected_parameters: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub tools_ordered: bool,

    /// Recorded candidate answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Reference answer; falls back to `answer` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_answer: Option<String>,
}

impl Question {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            expected_tools: Vec::new(),
            expected_parameters: serde_json::Map::new(),
            tools_ordered: false,
            answer: None,
            reference_answer: None,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference_answer.as_deref().or(self.answer.as_deref())
    }

    /// Tool expectations, or `None` when the fixture names none
    pub fn context(&self) -> Option<EvaluationContext> {
        let context = EvaluationContext {
            expected_tools: (!self.expected_tools.is_empty()).then(|| self.expected_tools.clone()),
            expected_parameters: (!self.expected_parameters.is_empty())
                .then(|| self.expected_parameters.clone()),
            tools_ordered: self.tools_ordered,
            extra: Default::default(),
        };
        context.has_tool_expectations().then_some(context)
    }

    /// Evaluation request for a candidate's output on this question
    pub fn request(&self, output: impl Into<String>) -> EvaluationRequest {
        let mut request = EvaluationRequest::new(&self.question, output);
        if let Some(reference) = self.reference() {
            request = request.with_expected(reference);
        }
        if let Some(context) = self.context() {
            request = request.with_context(context);
        }
        request
    }
}

/// Load a JSON array of questions
pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    if !path.exists() {
        return Err(JudgeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let questions: Vec<Question> = serde_json::from_str(&content).map_err(|e| {
        JudgeError::InvalidFixture(format!("{}: {}", path.display(), e))
    })?;

    tracing::debug!(path = %path.display(), count = questions.len(), "questions_loaded");
    Ok(questions)
}

/// Which questions to run: `all` or 1-based indices such as `1,3,5`
///
/// Indices are kept signed so that `-1` parses and is skipped at selection
/// time like any other out-of-range index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuestionSelection {
    #[default]
    All,
    Indices(Vec<i64>),
}

impl FromStr for QuestionSelection {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(QuestionSelection::All);
        }

        s.split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(QuestionSelection::Indices)
            .map_err(|_| {
                JudgeError::UsageError(
                    "invalid question indices; use comma-separated numbers (e.g. '1,3,5') or 'all'"
                        .to_string(),
                )
            })
    }
}

impl QuestionSelection {
    /// Pick questions, pairing each with its 0-based position in the fixture.
    ///
    /// Out-of-range indices are skipped with a warning. Selecting nothing is
    /// an error.
    pub fn select<'a>(&self, questions: &'a [Question]) -> Result<Vec<(usize, &'a Question)>> {
        let selected: Vec<(usize, &Question)> = match self {
            QuestionSelection::All => questions.iter().enumerate().collect(),
            QuestionSelection::Indices(indices) => indices
                .iter()
                .filter_map(|&index| {
                    let position = usize::try_from(index)
                        .ok()
                        .filter(|i| (1..=questions.len()).contains(i));
                    if let Some(position) = position {
                        Some((position - 1, &questions[position - 1]))
                    } else {
                        tracing::warn!(
                            index,
                            available = questions.len(),
                            "question index out of range (1-{})",
                            questions.len()
                        );
                        None
                    }
                })
                .collect(),
        };

        if selected.is_empty() {
            return Err(JudgeError::UsageError(
                "no valid questions selected".to_string(),
            ));
        }
        Ok(selected)
    }
}
