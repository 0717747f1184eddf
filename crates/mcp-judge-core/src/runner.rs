//! Benchmark runner: candidates answer, a judge or jury scores.

use crate::cancel::Cancellation;
use crate::candidate::Candidate;
use crate::error::{ExitCode, JudgeError, Result};
use crate::fixture::Question;
use crate::judge::{EvaluationRequest, Judge};
use crate::jury::Jury;
use crate::score::Score;
use crate::verdict::{Judgment, Verdict};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// What scores each answer
#[derive(Debug, Clone)]
pub enum Evaluator {
    Judge { judge: Judge, pass_threshold: f64 },
    Jury { jury: Jury, pass_threshold: f64 },
}

/// The verdict for one answer, plus individual judgments for juries
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub judgments: Option<Vec<Judgment>>,
}

impl Evaluator {
    pub fn describe(&self) -> String {
        match self {
            Evaluator::Judge { judge, .. } => {
                format!("judge {} ({}, {})", judge.name(), judge.model(), judge.score_type())
            }
            Evaluator::Jury { jury, .. } => format!(
                "jury of {} ({} voting)",
                jury.judges()
                    .iter()
                    .map(|j| j.name())
                    .collect::<Vec<_>>()
                    .join(", "),
                jury.voting()
            ),
        }
    }

    pub fn pass_threshold(&self) -> f64 {
        match self {
            Evaluator::Judge { pass_threshold, .. } | Evaluator::Jury { pass_threshold, .. } => {
                *pass_threshold
            }
        }
    }

    /// Score one answer, giving up when `cancellation` fires
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        cancellation: &Cancellation,
    ) -> Result<Evaluation> {
        match self {
            Evaluator::Judge { judge, .. } => {
                let verdict = tokio::select! {
                    result = judge.judge(request) => result?,
                    _ = cancellation.cancelled() => return Err(JudgeError::Cancelled),
                };
                Ok(Evaluation {
                    verdict,
                    judgments: None,
                })
            }
            Evaluator::Jury { jury, .. } => {
                let (verdict, judgments) = jury.vote_until(request, cancellation).await?.into_parts();
                Ok(Evaluation {
                    verdict,
                    judgments: Some(judgments),
                })
            }
        }
    }
}

/// One row of the result export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_index: usize,
    pub question: String,
    /// What the candidate answered; absent when it never produced an answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_answer: Option<String>,
    pub expected_tools: Vec<String>,
    pub expected_parameters: serde_json::Map<String, serde_json::Value>,
    pub score: Option<Score>,
    pub reasoning: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    /// Unparsed judge response (single judges and single-survivor juries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgments: Option<Vec<Judgment>>,
}

impl QuestionResult {
    fn new(question_index: usize, question: &Question, generated_answer: Option<String>) -> Self {
        Self {
            question_index,
            question: question.question.clone(),
            generated_answer,
            expected_tools: question.expected_tools.clone(),
            expected_parameters: question.expected_parameters.clone(),
            score: None,
            reasoning: String::new(),
            passed: false,
            error: false,
            raw_result: None,
            judgments: None,
        }
    }

    fn errored(
        question_index: usize,
        question: &Question,
        generated_answer: Option<String>,
        error: &JudgeError,
    ) -> Self {
        Self {
            reasoning: format!("Evaluation error: {}", error),
            error: true,
            ..Self::new(question_index, question, generated_answer)
        }
    }
}

/// Pass/fail counts for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub model: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub success_rate: f64,
}

impl RunSummary {
    pub fn from_results(model: impl Into<String>, results: &[QuestionResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let errored = results.iter().filter(|r| r.error).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };
        Self {
            model: model.into(),
            total,
            passed,
            failed: total - passed - errored,
            errored,
            success_rate,
        }
    }
}

/// All results for one candidate, in question order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRun {
    pub model: String,
    pub results: Vec<QuestionResult>,
}

impl ModelRun {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.model, &self.results)
    }
}

/// Outcome of a whole benchmark run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub evaluator: String,
    pub runs: Vec<ModelRun>,
    pub cancelled: bool,
}

pub struct Runner {
    evaluator: Evaluator,
    candidates: Vec<Arc<dyn Candidate>>,
    cancellation: Cancellation,
}

impl Runner {
    pub fn new(evaluator: Evaluator, candidates: Vec<Arc<dyn Candidate>>) -> Self {
        Self {
            evaluator,
            candidates,
            cancellation: Cancellation::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate every selected question for every candidate.
    ///
    /// Per-question failures become errored results. Configuration and
    /// usage errors abort the run.
    #[tracing::instrument(skip_all, fields(questions = questions.len(), candidates = self.candidates.len()))]
    pub async fn run(&self, questions: &[(usize, &Question)]) -> Result<RunReport> {
        let start = Instant::now();
        let mut runs = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let mut results = Vec::with_capacity(questions.len());
            for (index, question) in questions {
                let result = self.evaluate_question(candidate.as_ref(), *index, question).await?;
                tracing::info!(
                    candidate = candidate.name(),
                    question = index + 1,
                    passed = result.passed,
                    error = result.error,
                    "question_evaluated"
                );
                results.push(result);
            }
            runs.push(ModelRun {
                model: candidate.name().to_string(),
                results,
            });
        }

        crate::trace_time!(start, "benchmark_run");
        Ok(RunReport {
            evaluator: self.evaluator.describe(),
            runs,
            cancelled: self.cancellation.is_cancelled(),
        })
    }

    async fn evaluate_question(
        &self,
        candidate: &dyn Candidate,
        index: usize,
        question: &Question,
    ) -> Result<QuestionResult> {
        if self.cancellation.is_cancelled() {
            return Ok(QuestionResult::errored(index, question, None, &JudgeError::Cancelled));
        }

        let answered = tokio::select! {
            result = candidate.answer(question) => result,
            _ = self.cancellation.cancelled() => Err(JudgeError::Cancelled),
        };
        let output = match answered {
            Ok(output) => output,
            Err(e) => return Self::record_failure(index, question, None, e),
        };

        let outcome = self
            .evaluator
            .evaluate(&question.request(output.as_str()), &self.cancellation)
            .await;

        match outcome {
            Ok(evaluation) => {
                let verdict = evaluation.verdict;
                Ok(QuestionResult {
                    score: Some(*verdict.score()),
                    reasoning: verdict.reasoning().to_string(),
                    passed: verdict.passed(self.evaluator.pass_threshold()),
                    raw_result: verdict.raw_result().map(str::to_string),
                    judgments: evaluation.judgments,
                    ..QuestionResult::new(index, question, Some(output))
                })
            }
            Err(e) => Self::record_failure(index, question, Some(output), e),
        }
    }

    /// Usage and configuration errors abort the run; anything else is
    /// recorded against this question
    fn record_failure(
        index: usize,
        question: &Question,
        generated_answer: Option<String>,
        error: JudgeError,
    ) -> Result<QuestionResult> {
        if error.exit_code() == ExitCode::Usage {
            return Err(error);
        }
        tracing::warn!(question = index + 1, error = %error, "question_evaluation_failed");
        Ok(QuestionResult::errored(index, question, generated_answer, &error))
    }
}
