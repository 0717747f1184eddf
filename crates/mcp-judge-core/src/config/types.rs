//! Configuration type definitions

use crate::judge::RubricKind;
use crate::jury::VotingMethod;
use crate::score::ScoreKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Profiles file looked up in the working directory when none is given
pub const DEFAULT_PROFILES_FILE: &str = "mcp-judge.yaml";

/// Numerical score at or above which an answer passes
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.75;

/// Judge model used when no profiles file exists
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the OpenAI-compatible endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API base URL (defaults to the public OpenAI endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Literal API key. Prefer `api_key_env` so keys stay out of files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// One judge definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub name: String,

    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub score_type: ScoreKind,

    /// Lower numerical bound (numerical judges only; default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper numerical bound (numerical judges only; default unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default)]
    pub rubric: RubricKind,

    /// Custom user prompt template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

impl JudgeConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            temperature: 0.0,
            score_type: ScoreKind::default(),
            min: None,
            max: None,
            rubric: RubricKind::default(),
            template: None,
            timeout_secs: None,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

/// A jury assembled from named judges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JuryConfig {
    /// Judge names, in tie-break order
    pub judges: Vec<String>,

    #[serde(default)]
    pub voting: VotingMethod,

    /// One weight per judge (weighted_average only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,

    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

/// How a candidate produces its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    /// Ask a chat model, offering the MCP tool surface
    #[default]
    Chat,
    /// Replay the answer recorded in the fixture
    Recorded,
}

/// A model under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub name: String,

    #[serde(default)]
    pub kind: CandidateKind,

    /// Model identifier (chat candidates)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// JSON file listing the MCP tool surface offered to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<PathBuf>,
}

impl CandidateConfig {
    pub fn recorded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CandidateKind::Recorded,
            model: None,
            temperature: 0.0,
            system_prompt: None,
            tools: None,
        }
    }
}

/// Everything a profiles file declares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profiles {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub judges: Vec<JudgeConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jury: Option<JuryConfig>,

    #[serde(default)]
    pub candidates: Vec<CandidateConfig>,
}

fn default_pass_threshold() -> f64 {
    DEFAULT_PASS_THRESHOLD
}
