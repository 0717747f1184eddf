//! Voting methods that combine individual scores into one.

use crate::error::{JudgeError, Result};
use crate::score::{Likert, Score, ScoreKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a jury combines the scores of its surviving judges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VotingMethod {
    /// Most frequent score; ties go to the lowest-indexed judge
    #[default]
    Majority,
    /// Arithmetic mean of numerical scores
    Average,
    /// Weighted mean of numerical scores
    WeightedAverage,
    /// Median of numerical or likert scores
    Median,
}

impl VotingMethod {
    pub const ALL: [VotingMethod; 4] = [
        VotingMethod::Majority,
        VotingMethod::Average,
        VotingMethod::WeightedAverage,
        VotingMethod::Median,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VotingMethod::Majority => "majority",
            VotingMethod::Average => "average",
            VotingMethod::WeightedAverage => "weighted_average",
            VotingMethod::Median => "median",
        }
    }

    /// Reject score kinds this method cannot aggregate.
    ///
    /// `kinds` lists the declared score kind of every judge in the jury.
    pub fn check_compatible(&self, kinds: &[ScoreKind]) -> Result<()> {
        let incompatible = |kind: ScoreKind| {
            JudgeError::Configuration(format!(
                "{} voting cannot aggregate {} judges",
                self, kind
            ))
        };

        match self {
            VotingMethod::Majority => Ok(()),
            VotingMethod::Average | VotingMethod::WeightedAverage => {
                match kinds.iter().find(|k| **k != ScoreKind::Numerical) {
                    Some(kind) => Err(incompatible(*kind)),
                    None => Ok(()),
                }
            }
            VotingMethod::Median => {
                if kinds.contains(&ScoreKind::Boolean) {
                    return Err(incompatible(ScoreKind::Boolean));
                }
                let mixed = kinds.windows(2).any(|pair| pair[0] != pair[1]);
                if mixed {
                    return Err(JudgeError::Configuration(
                        "median voting requires every judge to share one score type".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Combine ballots given as `(judge_index, score)` pairs in judge order.
    ///
    /// `weights` is indexed by judge index and is only read by
    /// [`VotingMethod::WeightedAverage`].
    pub fn aggregate(&self, ballots: &[(usize, Score)], weights: Option<&[f64]>) -> Result<Score> {
        if ballots.is_empty() {
            return Err(JudgeError::Other("no ballots to aggregate".to_string()));
        }

        match self {
            VotingMethod::Majority => Ok(majority(ballots)),
            VotingMethod::Average => {
                let values = numerical_values(ballots, *self)?;
                Ok(Score::Numerical(
                    values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64,
                ))
            }
            VotingMethod::WeightedAverage => {
                let weights = weights.ok_or_else(|| {
                    JudgeError::Configuration(
                        "weighted_average voting requires weights".to_string(),
                    )
                })?;
                weighted_average(&numerical_values(ballots, *self)?, weights)
            }
            VotingMethod::Median => median(ballots),
        }
    }
}

impl fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VotingMethod {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        VotingMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| {
                JudgeError::UsageError(format!(
                    "unknown voting method '{}' (expected majority, average, weighted_average or median)",
                    s
                ))
            })
    }
}

/// Check a weight vector against the jury it belongs to.
///
/// Weights must match the judge count, be finite and non-negative, and at
/// least one must be positive.
pub fn validate_weights(weights: &[f64], judge_count: usize) -> Result<()> {
    if weights.len() != judge_count {
        return Err(JudgeError::Configuration(format!(
            "expected {} weights (one per judge), got {}",
            judge_count,
            weights.len()
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(JudgeError::Configuration(format!(
            "weights must be finite and non-negative, got {}",
            bad
        )));
    }
    if !weights.iter().any(|w| *w > 0.0) {
        return Err(JudgeError::Configuration(
            "at least one weight must be positive".to_string(),
        ));
    }
    Ok(())
}

fn majority(ballots: &[(usize, Score)]) -> Score {
    let count = |score: &Score| ballots.iter().filter(|(_, s)| s == score).count();
    let top = ballots.iter().map(|(_, s)| count(s)).max().unwrap_or(0);

    // Ballots are in judge order, so the first match is the lowest index
    ballots
        .iter()
        .map(|(_, s)| *s)
        .find(|s| count(s) == top)
        .unwrap_or(ballots[0].1)
}

fn numerical_values(ballots: &[(usize, Score)], method: VotingMethod) -> Result<Vec<(usize, f64)>> {
    ballots
        .iter()
        .map(|(index, score)| {
            score.as_f64().map(|v| (*index, v)).ok_or_else(|| {
                JudgeError::Configuration(format!(
                    "{} voting cannot aggregate {} judges",
                    method,
                    score.kind()
                ))
            })
        })
        .collect()
}

fn weighted_average(values: &[(usize, f64)], weights: &[f64]) -> Result<Score> {
    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;
    for (index, value) in values {
        let weight = weights.get(*index).copied().ok_or_else(|| {
            JudgeError::Configuration(format!("no weight configured for judge #{}", index + 1))
        })?;
        total_weight += weight;
        weighted_sum += weight * value;
    }

    if total_weight <= 0.0 {
        return Err(JudgeError::NoVerdict(
            "every surviving judge has weight 0; weighted average is undefined".to_string(),
        ));
    }
    Ok(Score::Numerical(weighted_sum / total_weight))
}

fn median(ballots: &[(usize, Score)]) -> Result<Score> {
    match ballots[0].1 {
        Score::Numerical(_) => {
            let mut values: Vec<f64> = numerical_values(ballots, VotingMethod::Median)?
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            values.sort_by(f64::total_cmp);
            let mid = values.len() / 2;
            let value = if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            };
            Ok(Score::Numerical(value))
        }
        Score::Likert(_) => {
            let mut levels = ballots
                .iter()
                .map(|(_, score)| match score {
                    Score::Likert(level) => Ok(*level),
                    other => Err(JudgeError::Configuration(format!(
                        "median voting cannot mix likert and {} scores",
                        other.kind()
                    ))),
                })
                .collect::<Result<Vec<Likert>>>()?;
            levels.sort();
            // Lower middle for even counts keeps the result a real level
            Ok(Score::Likert(levels[(levels.len() - 1) / 2]))
        }
        Score::Boolean(_) => Err(JudgeError::Configuration(
            "median voting cannot aggregate boolean judges".to_string(),
        )),
    }
}
