//! Score domains for judge verdicts.
//!
//! Every judge declares a [`ScoreType`]. The backend's structured response is
//! validated against that type before a verdict exists, so a verdict's score
//! always lies in its judge's domain.

use crate::error::{JudgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered four-level rating scale: `poor < fair < good < excellent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likert {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Likert {
    /// All levels in ascending order
    pub const ALL: [Likert; 4] = [Likert::Poor, Likert::Fair, Likert::Good, Likert::Excellent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Likert::Poor => "poor",
            Likert::Fair => "fair",
            Likert::Good => "good",
            Likert::Excellent => "excellent",
        }
    }
}

impl fmt::Display for Likert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Likert {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Likert::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| {
                JudgeError::Validation(format!(
                    "'{}' is not a likert level (expected poor, fair, good or excellent)",
                    s
                ))
            })
    }
}

/// Score kind as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    #[default]
    Boolean,
    Numerical,
    Likert,
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreKind::Boolean => write!(f, "boolean"),
            ScoreKind::Numerical => write!(f, "numerical"),
            ScoreKind::Likert => write!(f, "likert"),
        }
    }
}

/// Inclusive range for numerical scores. `max = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericalBounds {
    min: f64,
    max: Option<f64>,
}

impl Default for NumericalBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: None,
        }
    }
}

impl NumericalBounds {
    pub fn new(min: f64, max: Option<f64>) -> Result<Self> {
        if !min.is_finite() || min < 0.0 {
            return Err(JudgeError::Configuration(format!(
                "numerical minimum must be a finite non-negative number, got {}",
                min
            )));
        }
        if let Some(max) = max {
            if !max.is_finite() || max < min {
                return Err(JudgeError::Configuration(format!(
                    "numerical maximum {} must be finite and >= minimum {}",
                    max, min
                )));
            }
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

impl fmt::Display for NumericalBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, +inf)", self.min),
        }
    }
}

/// The domain and validation rule for a verdict's score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreType {
    Boolean,
    Numerical(NumericalBounds),
    Likert,
}

/// A validated score value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Boolean(bool),
    Numerical(f64),
    Likert(Likert),
}

impl Score {
    pub fn kind(&self) -> ScoreKind {
        match self {
            Score::Boolean(_) => ScoreKind::Boolean,
            Score::Numerical(_) => ScoreKind::Numerical,
            Score::Likert(_) => ScoreKind::Likert,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Numerical(value) => Some(*value),
            _ => None,
        }
    }

    /// Pass/fail projection: `true`, a number at or above `threshold`,
    /// or a likert level of `good` or better.
    pub fn passes(&self, threshold: f64) -> bool {
        match self {
            Score::Boolean(value) => *value,
            Score::Numerical(value) => *value >= threshold,
            Score::Likert(level) => *level >= Likert::Good,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Boolean(value) => write!(f, "{}", value),
            Score::Numerical(value) => write!(f, "{:.2}", value),
            Score::Likert(level) => write!(f, "{}", level),
        }
    }
}

impl ScoreType {
    /// Numerical type with the default `[0, +inf)` range
    pub fn numerical() -> Self {
        ScoreType::Numerical(NumericalBounds::default())
    }

    /// Build a score type from its configured kind and optional bounds
    pub fn from_kind(kind: ScoreKind, min: Option<f64>, max: Option<f64>) -> Result<Self> {
        match kind {
            ScoreKind::Boolean => Ok(ScoreType::Boolean),
            ScoreKind::Likert => Ok(ScoreType::Likert),
            ScoreKind::Numerical => Ok(ScoreType::Numerical(NumericalBounds::new(
                min.unwrap_or(0.0),
                max,
            )?)),
        }
    }

    pub fn kind(&self) -> ScoreKind {
        match self {
            ScoreType::Boolean => ScoreKind::Boolean,
            ScoreType::Numerical(_) => ScoreKind::Numerical,
            ScoreType::Likert => ScoreKind::Likert,
        }
    }

    /// Validate a structured `score` field without coercion
    pub fn parse(&self, value: &serde_json::Value) -> Result<Score> {
        let score = match self {
            ScoreType::Boolean => value.as_bool().map(Score::Boolean).ok_or_else(|| {
                JudgeError::Validation(format!("expected a boolean score, got {}", value))
            })?,
            ScoreType::Numerical(_) => {
                let number = value.as_f64().ok_or_else(|| {
                    JudgeError::Validation(format!("expected a numerical score, got {}", value))
                })?;
                Score::Numerical(number)
            }
            ScoreType::Likert => {
                let text = value.as_str().ok_or_else(|| {
                    JudgeError::Validation(format!("expected a likert level, got {}", value))
                })?;
                Score::Likert(text.parse()?)
            }
        };
        self.check(&score)?;
        Ok(score)
    }

    /// Confirm a score belongs to this domain
    pub fn check(&self, score: &Score) -> Result<()> {
        match (self, score) {
            (ScoreType::Boolean, Score::Boolean(_)) | (ScoreType::Likert, Score::Likert(_)) => {
                Ok(())
            }
            (ScoreType::Numerical(bounds), Score::Numerical(value)) => {
                if bounds.contains(*value) {
                    Ok(())
                } else {
                    Err(JudgeError::Validation(format!(
                        "numerical score {} is outside {}",
                        value, bounds
                    )))
                }
            }
            _ => Err(JudgeError::Validation(format!(
                "{} score does not match {} judge",
                score.kind(),
                self.kind()
            ))),
        }
    }

    /// Score given when the candidate produced no output at all
    pub fn failing(&self) -> Score {
        match self {
            ScoreType::Boolean => Score::Boolean(false),
            ScoreType::Numerical(bounds) => Score::Numerical(bounds.min()),
            ScoreType::Likert => Score::Likert(Likert::Poor),
        }
    }

    /// JSON schema of the structured response requested from the backend
    pub fn schema(&self) -> serde_json::Value {
        let score = match self {
            ScoreType::Boolean => serde_json::json!({ "type": "boolean" }),
            ScoreType::Numerical(bounds) => {
                let mut schema = serde_json::json!({ "type": "number", "minimum": bounds.min() });
                if let Some(max) = bounds.max() {
                    schema["maximum"] = serde_json::json!(max);
                }
                schema
            }
            ScoreType::Likert => serde_json::json!({
                "type": "string",
                "enum": Likert::ALL.iter().map(|l| l.as_str()).collect::<Vec<_>>(),
            }),
        };

        serde_json::json!({
            "type": "object",
            "properties": {
                "score": score,
                "reasoning": { "type": "string" },
            },
            "required": ["score", "reasoning"],
        })
    }

    /// Prompt fragment describing the expected `score` field
    pub fn instructions(&self) -> String {
        match self {
            ScoreType::Boolean => {
                "\"score\": true if the answer passes evaluation, false otherwise".to_string()
            }
            ScoreType::Numerical(bounds) => match bounds.max() {
                Some(max) => format!(
                    "\"score\": a number between {} and {} (higher is better)",
                    bounds.min(),
                    max
                ),
                None => format!(
                    "\"score\": a number greater than or equal to {} (higher is better)",
                    bounds.min()
                ),
            },
            ScoreType::Likert => {
                "\"score\": one of \"poor\", \"fair\", \"good\", \"excellent\"".to_string()
            }
        }
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreType::Numerical(bounds) => write!(f, "numerical {}", bounds),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_rejects_non_booleans() {
        let ty = ScoreType::Boolean;
        assert_eq!(ty.parse(&json!(true)).unwrap(), Score::Boolean(true));
        assert_eq!(ty.parse(&json!(false)).unwrap(), Score::Boolean(false));

        for value in [json!("maybe"), json!("true"), json!(1), json!(null)] {
            let err = ty.parse(&value).unwrap_err();
            assert!(matches!(err, JudgeError::Validation(_)), "{value}");
        }
    }

    #[test]
    fn test_numerical_defaults_to_non_negative() {
        let ty = ScoreType::numerical();
        assert_eq!(ty.parse(&json!(0.8)).unwrap(), Score::Numerical(0.8));
        assert_eq!(ty.parse(&json!(42)).unwrap(), Score::Numerical(42.0));
        assert!(ty.parse(&json!(-0.1)).is_err());
        assert!(ty.parse(&json!("0.8")).is_err());
    }

    #[test]
    fn test_numerical_upper_bound() {
        let ty = ScoreType::from_kind(ScoreKind::Numerical, None, Some(1.0)).unwrap();
        assert!(ty.parse(&json!(1.0)).is_ok());
        let err = ty.parse(&json!(1.5)).unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn test_bounds_validation() {
        assert!(NumericalBounds::new(-1.0, None).is_err());
        assert!(NumericalBounds::new(2.0, Some(1.0)).is_err());
        assert!(NumericalBounds::new(0.0, Some(f64::INFINITY)).is_err());
        assert!(NumericalBounds::new(1.0, Some(1.0)).is_ok());
    }

    #[test]
    fn test_likert_order_and_parsing() {
        assert!(Likert::Poor < Likert::Fair);
        assert!(Likert::Fair < Likert::Good);
        assert!(Likert::Good < Likert::Excellent);

        let ty = ScoreType::Likert;
        assert_eq!(
            ty.parse(&json!(" Excellent ")).unwrap(),
            Score::Likert(Likert::Excellent)
        );
        assert!(ty.parse(&json!("great")).is_err());
        assert!(ty.parse(&json!(3)).is_err());
    }

    #[test]
    fn test_check_rejects_mismatched_kind() {
        let err = ScoreType::Boolean
            .check(&Score::Likert(Likert::Good))
            .unwrap_err();
        assert!(err.to_string().contains("likert score does not match boolean judge"));
    }

    #[test]
    fn test_failing_scores() {
        assert_eq!(ScoreType::Boolean.failing(), Score::Boolean(false));
        assert_eq!(ScoreType::Likert.failing(), Score::Likert(Likert::Poor));
        let ty = ScoreType::from_kind(ScoreKind::Numerical, Some(1.0), Some(10.0)).unwrap();
        assert_eq!(ty.failing(), Score::Numerical(1.0));
    }

    #[test]
    fn test_passes() {
        assert!(Score::Boolean(true).passes(0.75));
        assert!(!Score::Boolean(false).passes(0.0));
        assert!(Score::Numerical(0.8).passes(0.75));
        assert!(!Score::Numerical(0.7).passes(0.75));
        assert!(Score::Likert(Likert::Good).passes(0.75));
        assert!(!Score::Likert(Likert::Fair).passes(0.75));
    }

    #[test]
    fn test_schema_shapes() {
        let schema = ScoreType::Likert.schema();
        assert_eq!(schema["properties"]["score"]["enum"][3], "excellent");
        assert_eq!(schema["required"], json!(["score", "reasoning"]));

        let bounded = ScoreType::from_kind(ScoreKind::Numerical, None, Some(5.0)).unwrap();
        assert_eq!(bounded.schema()["properties"]["score"]["maximum"], 5.0);
    }

    #[test]
    fn test_score_serializes_untagged() {
        assert_eq!(serde_json::to_value(Score::Boolean(true)).unwrap(), json!(true));
        assert_eq!(serde_json::to_value(Score::Numerical(0.5)).unwrap(), json!(0.5));
        assert_eq!(
            serde_json::to_value(Score::Likert(Likert::Fair)).unwrap(),
            json!("fair")
        );
        let back: Score = serde_json::from_value(json!("good")).unwrap();
        assert_eq!(back, Score::Likert(Likert::Good));
    }
}
