//! Multi-judge evaluation.
//!
//! A [`Jury`] runs every judge concurrently against the same request and
//! folds the surviving verdicts into an [`AggregateVerdict`]. Judges that
//! fail (backend error, invalid response, timeout) are recorded in the
//! judgments list and excluded from the vote.

pub mod voting;

use crate::cancel::Cancellation;
use crate::error::{JudgeError, Result};
use crate::judge::{EvaluationRequest, Judge};
use crate::score::{Score, ScoreKind};
use crate::verdict::{AggregateVerdict, Judgment, Verdict};
use std::time::Instant;
use tokio::task::JoinSet;

pub use voting::{validate_weights, VotingMethod};

/// An ordered set of judges plus the rule that combines their scores
#[derive(Debug, Clone)]
pub struct Jury {
    judges: Vec<Judge>,
    voting: VotingMethod,
    weights: Option<Vec<f64>>,
}

impl Jury {
    /// Build a jury, rejecting setups that could never produce a vote.
    ///
    /// Fails with [`JudgeError::Configuration`] when there are no judges,
    /// when the voting method cannot aggregate a judge's score type, or when
    /// weights are malformed. Weights are required for
    /// [`VotingMethod::WeightedAverage`].
    pub fn new(judges: Vec<Judge>, voting: VotingMethod, weights: Option<Vec<f64>>) -> Result<Self> {
        if judges.is_empty() {
            return Err(JudgeError::Configuration(
                "a jury needs at least one judge".to_string(),
            ));
        }

        let kinds: Vec<ScoreKind> = judges.iter().map(|j| j.score_type().kind()).collect();
        voting.check_compatible(&kinds)?;

        match (&weights, voting) {
            (Some(weights), _) => validate_weights(weights, judges.len())?,
            (None, VotingMethod::WeightedAverage) => {
                return Err(JudgeError::Configuration(
                    "weighted_average voting requires one weight per judge".to_string(),
                ))
            }
            (None, _) => {}
        }

        Ok(Self {
            judges,
            voting,
            weights,
        })
    }

    pub fn judges(&self) -> &[Judge] {
        &self.judges
    }

    pub fn voting(&self) -> VotingMethod {
        self.voting
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Evaluate one answer with every judge and combine the results.
    ///
    /// Dropping the returned future aborts all in-flight judge calls.
    #[tracing::instrument(skip(self, request), fields(judges = self.judges.len(), voting = %self.voting))]
    pub async fn vote(&self, request: &EvaluationRequest) -> Result<AggregateVerdict> {
        request.validate()?;

        let start = Instant::now();
        let judgments = self.collect_judgments(request).await?;
        crate::trace_time!(start, "jury_judgments");

        self.aggregate(judgments)
    }

    /// Like [`Jury::vote`], but gives up with [`JudgeError::Cancelled`] as
    /// soon as `cancellation` fires.
    pub async fn vote_until(
        &self,
        request: &EvaluationRequest,
        cancellation: &Cancellation,
    ) -> Result<AggregateVerdict> {
        tokio::select! {
            result = self.vote(request) => result,
            _ = cancellation.cancelled() => {
                tracing::warn!("jury_vote_cancelled");
                Err(JudgeError::Cancelled)
            }
        }
    }

    /// Run all judges and return their judgments in jury order
    async fn collect_judgments(&self, request: &EvaluationRequest) -> Result<Vec<Judgment>> {
        let mut tasks = JoinSet::new();
        for (index, judge) in self.judges.iter().enumerate() {
            let judge = judge.clone();
            let request = request.clone();
            tasks.spawn(async move { (index, judge.judge(&request).await) });
        }

        let mut results: Vec<Option<Result<Verdict>>> =
            std::iter::repeat_with(|| None).take(self.judges.len()).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "judge_task_failed"),
            }
        }

        results
            .into_iter()
            .zip(&self.judges)
            .enumerate()
            .map(|(index, (result, judge))| {
                let result = result.unwrap_or_else(|| {
                    Err(JudgeError::backend(
                        crate::error::BackendErrorKind::Internal,
                        "judge task panicked before returning a verdict",
                    ))
                });
                match result {
                    Ok(verdict) => Ok(Judgment::delivered(judge.name(), index, verdict)),
                    Err(e) if e.is_judge_failure() => {
                        tracing::warn!(judge = judge.name(), error = %e, "judge_failed");
                        Ok(Judgment::failed(judge.name(), index, &e))
                    }
                    Err(e) => Err(e),
                }
            })
            .collect()
    }

    fn aggregate(&self, judgments: Vec<Judgment>) -> Result<AggregateVerdict> {
        let survivors: Vec<(usize, &Verdict)> = judgments
            .iter()
            .filter_map(|j| j.verdict().map(|v| (j.index, v)))
            .collect();

        match survivors.as_slice() {
            [] => Err(JudgeError::AllJudgesFailed {
                failures: judgments.len(),
            }),
            [(_, only)] => {
                let verdict = (*only).clone();
                Ok(AggregateVerdict::new(verdict, judgments))
            }
            _ => {
                let ballots: Vec<(usize, Score)> =
                    survivors.iter().map(|(i, v)| (*i, *v.score())).collect();
                let score = self.voting.aggregate(&ballots, self.weights())?;
                let reasoning = summarize(self.voting, &score, &judgments);
                tracing::debug!(score = %score, survivors = ballots.len(), "jury_verdict");
                Ok(AggregateVerdict::new(
                    Verdict::new(score, reasoning, None)?,
                    judgments,
                ))
            }
        }
    }
}

/// One line per judge, headed by the combined score and any failures
fn summarize(voting: VotingMethod, score: &Score, judgments: &[Judgment]) -> String {
    let failed: Vec<&Judgment> = judgments.iter().filter(|j| j.is_failure()).collect();
    let survivors = judgments.len() - failed.len();

    let mut lines = vec![format!(
        "{} of {} judges: {}",
        voting, survivors, score
    )];

    for judgment in judgments {
        if let Some(verdict) = judgment.verdict() {
            lines.push(format!(
                "[{}] {}: {}",
                judgment.judge,
                verdict.score(),
                verdict.reasoning()
            ));
        }
    }

    if !failed.is_empty() {
        let names = failed
            .iter()
            .map(|j| j.judge.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{} of {} judges failed and were excluded: {}",
            failed.len(),
            judgments.len(),
            names
        ));
    }

    lines.join("\n")
}
