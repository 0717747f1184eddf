//! Verdicts produced by judges and juries.

use crate::error::{JudgeError, Result};
use crate::score::Score;
use serde::Serialize;

/// The structured outcome of one evaluation.
///
/// Fields are private and there are no setters: a verdict cannot change after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    score: Score,
    reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_result: Option<String>,
}

impl Verdict {
    /// Create a verdict. Reasoning must contain non-whitespace text.
    pub fn new(score: Score, reasoning: impl Into<String>, raw_result: Option<String>) -> Result<Self> {
        let reasoning = reasoning.into();
        if reasoning.trim().is_empty() {
            return Err(JudgeError::Validation(
                "verdict reasoning must not be empty".to_string(),
            ));
        }
        Ok(Self {
            score,
            reasoning,
            raw_result,
        })
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// The unparsed backend response, when one exists
    pub fn raw_result(&self) -> Option<&str> {
        self.raw_result.as_deref()
    }

    pub fn passed(&self, threshold: f64) -> bool {
        self.score.passes(threshold)
    }
}

/// What one jury member contributed to a vote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JudgmentOutcome {
    Delivered(Verdict),
    Failed { error_type: String, message: String },
}

/// One judge's entry in an aggregate verdict, in jury order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgment {
    pub judge: String,
    pub index: usize,
    pub outcome: JudgmentOutcome,
}

impl Judgment {
    pub fn delivered(judge: impl Into<String>, index: usize, verdict: Verdict) -> Self {
        Self {
            judge: judge.into(),
            index,
            outcome: JudgmentOutcome::Delivered(verdict),
        }
    }

    pub fn failed(judge: impl Into<String>, index: usize, error: &JudgeError) -> Self {
        Self {
            judge: judge.into(),
            index,
            outcome: JudgmentOutcome::Failed {
                error_type: error.error_type().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.outcome {
            JudgmentOutcome::Delivered(verdict) => Some(verdict),
            JudgmentOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.verdict().is_none()
    }
}

/// A jury's combined verdict plus every individual judgment behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateVerdict {
    #[serde(flatten)]
    verdict: Verdict,
    judgments: Vec<Judgment>,
}

impl AggregateVerdict {
    pub fn new(verdict: Verdict, judgments: Vec<Judgment>) -> Self {
        Self { verdict, judgments }
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn score(&self) -> &Score {
        self.verdict.score()
    }

    pub fn reasoning(&self) -> &str {
        self.verdict.reasoning()
    }

    pub fn judgments(&self) -> &[Judgment] {
        &self.judgments
    }

    /// Number of judges excluded from the vote because they failed
    pub fn failure_count(&self) -> usize {
        self.judgments.iter().filter(|j| j.is_failure()).count()
    }

    pub fn into_parts(self) -> (Verdict, Vec<Judgment>) {
        (self.verdict, self.judgments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Likert;

    #[test]
    fn test_verdict_reads_back_inputs() {
        let verdict = Verdict::new(
            Score::Likert(Likert::Good),
            "Uses the expected tool",
            Some("{\"score\":\"good\"}".to_string()),
        )
        .unwrap();

        assert_eq!(verdict.score(), &Score::Likert(Likert::Good));
        assert_eq!(verdict.reasoning(), "Uses the expected tool");
        assert_eq!(verdict.raw_result(), Some("{\"score\":\"good\"}"));

        // Reading twice observes the same values
        assert_eq!(verdict.score(), &Score::Likert(Likert::Good));
        assert_eq!(verdict.reasoning(), "Uses the expected tool");
    }

    #[test]
    fn test_verdict_without_raw_result() {
        let verdict = Verdict::new(Score::Boolean(true), "ok", None).unwrap();
        assert_eq!(verdict.raw_result(), None);
        let json = serde_json::to_value(&verdict).unwrap();
        assert!(json.get("raw_result").is_none());
    }

    #[test]
    fn test_verdict_requires_reasoning() {
        let err = Verdict::new(Score::Boolean(true), "   ", None).unwrap_err();
        assert!(matches!(err, JudgeError::Validation(_)));
    }

    #[test]
    fn test_failed_judgment_records_error() {
        let error = JudgeError::Validation("expected a boolean score, got \"maybe\"".into());
        let judgment = Judgment::failed("gemini", 1, &error);
        assert!(judgment.is_failure());
        assert!(judgment.verdict().is_none());

        let json = serde_json::to_value(&judgment).unwrap();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["error_type"], "validation_error");
    }

    #[test]
    fn test_aggregate_serializes_flat() {
        let verdict = Verdict::new(Score::Numerical(0.8), "mean of 2", None).unwrap();
        let member = Verdict::new(Score::Numerical(0.8), "fine", None).unwrap();
        let aggregate = AggregateVerdict::new(
            verdict,
            vec![
                Judgment::delivered("a", 0, member),
                Judgment::failed("b", 1, &JudgeError::Timeout(std::time::Duration::from_secs(1))),
            ],
        );

        assert_eq!(aggregate.failure_count(), 1);
        let json = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(json["score"], 0.8);
        assert_eq!(json["judgments"][0]["outcome"]["status"], "delivered");
        assert_eq!(json["judgments"][0]["outcome"]["score"], 0.8);
    }
}
