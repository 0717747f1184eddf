//! Single-judge evaluation.
//!
//! A [`Judge`] pairs a score type and a prompt [`Rubric`] with a text
//! generation [`Backend`]. Each call to [`Judge::judge`] makes at most one
//! backend call and yields exactly one validated [`Verdict`].
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_judge_core::backend::OpenAiBackend;
//! use mcp_judge_core::judge::{EvaluationRequest, Judge, RubricKind};
//! use mcp_judge_core::score::ScoreType;
//! use std::sync::Arc;
//!
//! # async fn run() -> mcp_judge_core::error::Result<()> {
//! let backend = Arc::new(OpenAiBackend::from_env(None)?);
//! let judge = Judge::new("gpt-judge", "gpt-4o-mini", ScoreType::Boolean, backend)
//!     .with_rubric(RubricKind::Mcp.build());
//! let verdict = judge
//!     .judge(&EvaluationRequest::new("How do I list files?", "Use `ls`."))
//!     .await?;
//! println!("{}: {}", verdict.score(), verdict.reasoning());
//! # Ok(())
//! # }
//! ```

pub mod parse;
pub mod rubric;
pub mod types;

use crate::backend::{Backend, CompletionRequest};
use crate::error::{JudgeError, Result};
use crate::score::ScoreType;
use crate::verdict::Verdict;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use parse::{extract_json_object, parse_verdict};
pub use rubric::{render_template, GeneralRubric, McpRubric, Rubric, RubricKind};
pub use types::{EvaluationContext, EvaluationRequest};

const NO_OUTPUT_REASONING: &str =
    "The candidate produced no output, so the task was not accomplished.";

/// One scoring policy bound to one backend. Cheap to clone; holds no
/// per-call state.
#[derive(Clone)]
pub struct Judge {
    name: String,
    model: String,
    temperature: f32,
    score_type: ScoreType,
    rubric: Arc<dyn Rubric>,
    template: Option<String>,
    timeout: Option<Duration>,
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for Judge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Judge")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("score_type", &self.score_type)
            .field("rubric", &self.rubric.name())
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Judge {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        score_type: ScoreType,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            temperature: 0.0,
            score_type,
            rubric: Arc::new(McpRubric),
            template: None,
            timeout: None,
            backend,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_rubric(mut self, rubric: Arc<dyn Rubric>) -> Self {
        self.rubric = rubric;
        self
    }

    /// Replace the rubric's user prompt with a custom template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn score_type(&self) -> &ScoreType {
        &self.score_type
    }

    /// Build the backend request for an evaluation
    pub fn completion_request(&self, request: &EvaluationRequest) -> CompletionRequest {
        let user_prompt = match &self.template {
            Some(template) => render_template(template, request, &self.score_type),
            None => self.rubric.user_prompt(request, &self.score_type),
        };

        CompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            system_prompt: self.rubric.system_prompt(),
            user_prompt,
            schema: self.score_type.schema(),
        }
    }

    /// Evaluate one answer.
    ///
    /// Empty candidate output yields the score type's failing verdict without
    /// calling the backend. Backend, timeout and validation failures are
    /// returned as errors for which [`JudgeError::is_judge_failure`] holds.
    #[tracing::instrument(skip(self, request), fields(judge = %self.name, model = %self.model, score_type = %self.score_type.kind()))]
    pub async fn judge(&self, request: &EvaluationRequest) -> Result<Verdict> {
        request.validate()?;

        if !request.has_output() {
            tracing::debug!("candidate_output_empty");
            return Verdict::new(self.score_type.failing(), NO_OUTPUT_REASONING, None);
        }

        let start = Instant::now();
        let completion = self.completion_request(request);
        let call = self.backend.complete(&completion);

        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| JudgeError::Timeout(limit))??,
            None => call.await?,
        };
        crate::trace_time!(start, "backend_call", judge = self.name.as_str());

        let verdict = parse_verdict(&raw, &self.score_type).inspect_err(|e| {
            tracing::warn!(judge = %self.name, error = %e, "judge_response_invalid");
        })?;

        tracing::debug!(score = %verdict.score(), "verdict");
        Ok(verdict)
    }
}
