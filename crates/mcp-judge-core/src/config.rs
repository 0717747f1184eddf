//! Profiles configuration for mcp-judge
//!
//! A profiles file (YAML or TOML, chosen by extension) declares the backend
//! connection, the judges, an optional jury and the candidates under test.

pub mod types;

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::openai::{resolve_api_key, DEFAULT_BASE_URL};
use crate::backend::{Backend, OpenAiBackend};
use crate::error::{JudgeError, Result};
use crate::judge::Judge;
use crate::jury::{validate_weights, Jury, VotingMethod};
use crate::score::{ScoreKind, ScoreType};

pub use types::{
    BackendConfig, CandidateConfig, CandidateKind, JudgeConfig, JuryConfig, Profiles,
    DEFAULT_JUDGE_MODEL, DEFAULT_PASS_THRESHOLD, DEFAULT_PROFILES_FILE,
};

impl BackendConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Resolve the API key: literal value, then `api_key_env`, then the
    /// default environment variables
    pub fn api_key(&self) -> Result<String> {
        if let Some(var) = self.api_key_env.as_deref() {
            if self.api_key.is_none() {
                return std::env::var(var)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        JudgeError::Configuration(format!(
                            "{} environment variable must be set",
                            var
                        ))
                    });
            }
        }
        resolve_api_key(self.api_key.as_deref())
    }

    pub fn build(&self) -> Result<Arc<dyn Backend>> {
        Ok(Arc::new(OpenAiBackend::new(self.base_url(), self.api_key()?)))
    }
}

impl JudgeConfig {
    pub fn score_type(&self) -> Result<ScoreType> {
        if self.score_type != ScoreKind::Numerical && (self.min.is_some() || self.max.is_some()) {
            return Err(JudgeError::Configuration(format!(
                "judge '{}': min/max only apply to numerical judges",
                self.name
            )));
        }
        ScoreType::from_kind(self.score_type, self.min, self.max)
    }

    /// Check this judge in isolation
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(JudgeError::Configuration(
                "judge name must not be empty".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(JudgeError::Configuration(format!(
                "judge '{}' has no model",
                self.name
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(JudgeError::Configuration(format!(
                "judge '{}': temperature {} is outside [0, 2]",
                self.name, self.temperature
            )));
        }
        if !self.pass_threshold.is_finite() {
            return Err(JudgeError::Configuration(format!(
                "judge '{}': pass_threshold must be finite",
                self.name
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(JudgeError::Configuration(format!(
                "judge '{}': timeout_secs must be positive",
                self.name
            )));
        }
        self.score_type().map(|_| ())
    }

    pub fn build(&self, backend: Arc<dyn Backend>) -> Result<Judge> {
        self.validate()?;

        let mut judge = Judge::new(&self.name, &self.model, self.score_type()?, backend)
            .with_temperature(self.temperature)
            .with_rubric(self.rubric.build());
        if let Some(template) = &self.template {
            judge = judge.with_template(template);
        }
        if let Some(secs) = self.timeout_secs {
            judge = judge.with_timeout(Duration::from_secs(secs));
        }
        Ok(judge)
    }
}

impl Profiles {
    /// Load a profiles file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(JudgeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let profiles: Profiles = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        tracing::debug!(
            path = %path.display(),
            judges = profiles.judges.len(),
            candidates = profiles.candidates.len(),
            "profiles_loaded"
        );
        Ok(profiles)
    }

    /// Load `path`, or `mcp-judge.yaml` when present, or fall back to the
    /// built-in single-judge profile
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_PROFILES_FILE);
        if default_path.exists() {
            return Self::load(default_path);
        }

        tracing::debug!("no profiles file found, using built-in judge");
        Ok(Self::builtin())
    }

    /// One boolean MCP judge and the recorded-answer candidate
    pub fn builtin() -> Self {
        Self {
            backend: BackendConfig::default(),
            judges: vec![JudgeConfig::new("default", DEFAULT_JUDGE_MODEL)],
            jury: None,
            candidates: vec![CandidateConfig::recorded("recorded")],
        }
    }

    pub fn judge(&self, name: &str) -> Result<&JudgeConfig> {
        self.judges.iter().find(|j| j.name == name).ok_or_else(|| {
            let known = self
                .judges
                .iter()
                .map(|j| j.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            JudgeError::UsageError(format!("unknown judge '{}' (available: {})", name, known))
        })
    }

    /// The first configured judge
    pub fn default_judge(&self) -> Result<&JudgeConfig> {
        self.judges
            .first()
            .ok_or_else(|| JudgeError::Configuration("no judges configured".to_string()))
    }

    pub fn candidate(&self, name: &str) -> Result<&CandidateConfig> {
        self.candidates
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| JudgeError::UsageError(format!("unknown candidate '{}'", name)))
    }

    /// Check the whole file for setup mistakes before anything runs
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for judge in &self.judges {
            judge.validate()?;
            if !names.insert(judge.name.as_str()) {
                return Err(JudgeError::Configuration(format!(
                    "duplicate judge name '{}'",
                    judge.name
                )));
            }
        }

        if let Some(jury) = &self.jury {
            self.validate_jury(jury)?;
        }

        let mut candidates = HashSet::new();
        for candidate in &self.candidates {
            if !candidates.insert(candidate.name.as_str()) {
                return Err(JudgeError::Configuration(format!(
                    "duplicate candidate name '{}'",
                    candidate.name
                )));
            }
            if candidate.kind == CandidateKind::Chat && candidate.model.is_none() {
                return Err(JudgeError::Configuration(format!(
                    "chat candidate '{}' needs a model",
                    candidate.name
                )));
            }
        }

        Ok(())
    }

    /// Check a jury against the judges it names, without building anything
    pub fn validate_jury(&self, jury: &JuryConfig) -> Result<()> {
        if jury.judges.is_empty() {
            return Err(JudgeError::Configuration(
                "jury lists no judges".to_string(),
            ));
        }

        let kinds = jury
            .judges
            .iter()
            .map(|name| {
                self.judge(name)
                    .map(|j| j.score_type)
                    .map_err(|_| JudgeError::Configuration(format!("jury references unknown judge '{}'", name)))
            })
            .collect::<Result<Vec<_>>>()?;

        jury.voting.check_compatible(&kinds)?;

        match (&jury.weights, jury.voting) {
            (Some(weights), _) => validate_weights(weights, jury.judges.len()),
            (None, VotingMethod::WeightedAverage) => Err(JudgeError::Configuration(
                "weighted_average voting requires weights".to_string(),
            )),
            (None, _) => Ok(()),
        }
    }

    /// Build the jury described by `jury`, sharing one backend
    pub fn build_jury(&self, jury: &JuryConfig, backend: Arc<dyn Backend>) -> Result<Jury> {
        self.validate_jury(jury)?;

        let judges = jury
            .judges
            .iter()
            .map(|name| self.judge(name)?.build(backend.clone()))
            .collect::<Result<Vec<_>>>()?;

        Jury::new(judges, jury.voting, jury.weights.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::judge::RubricKind;
    use tempfile::tempdir;

    const YAML: &str = r#"
backend:
  base_url: http://localhost:8080
  api_key_env: JUDGE_KEY
judges:
  - name: strict
    model: gpt-4o
    score_type: boolean
  - name: scorer
    model: gpt-4o-mini
    score_type: numerical
    max: 1.0
    temperature: 0.2
    timeout_secs: 30
  - name: rater
    model: claude-3-5-haiku
    score_type: likert
    rubric: general
jury:
  judges: [strict, scorer]
  voting: majority
candidates:
  - name: recorded
    kind: recorded
  - name: gpt
    model: gpt-4o
    tools: tools.json
"#;

    fn scripted() -> Arc<dyn Backend> {
        Arc::new(ScriptedBackend::new())
    }

    #[test]
    fn test_load_yaml_profiles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mcp-judge.yaml");
        fs::write(&path, YAML).unwrap();

        let profiles = Profiles::load(&path).unwrap();

        assert_eq!(profiles.backend.base_url(), "http://localhost:8080");
        assert_eq!(profiles.judges.len(), 3);
        assert_eq!(profiles.judges[0].rubric, RubricKind::Mcp);
        assert_eq!(profiles.judges[0].pass_threshold, DEFAULT_PASS_THRESHOLD);
        assert_eq!(profiles.judges[2].rubric, RubricKind::General);
        assert_eq!(profiles.candidates[0].kind, CandidateKind::Recorded);
        assert_eq!(profiles.candidates[1].kind, CandidateKind::Chat);
        profiles.validate().unwrap();
    }

    #[test]
    fn test_load_toml_profiles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.toml");
        fs::write(
            &path,
            r#"
[[judges]]
name = "a"
model = "m1"
score_type = "numerical"

[[judges]]
name = "b"
model = "m2"
score_type = "numerical"

[jury]
judges = ["a", "b"]
voting = "weighted_average"
weights = [3.0, 1.0]
"#,
        )
        .unwrap();

        let profiles = Profiles::load(&path).unwrap();
        profiles.validate().unwrap();

        let jury = profiles
            .build_jury(profiles.jury.as_ref().unwrap(), scripted())
            .unwrap();
        assert_eq!(jury.voting(), VotingMethod::WeightedAverage);
        assert_eq!(jury.weights(), Some(&[3.0, 1.0][..]));
    }

    #[test]
    fn test_missing_file() {
        let err = Profiles::load(Path::new("/nonexistent/mcp-judge.yaml")).unwrap_err();
        assert!(matches!(err, JudgeError::FileNotFound { .. }));
    }

    #[test]
    fn test_builtin_profile_is_valid() {
        let profiles = Profiles::builtin();
        profiles.validate().unwrap();
        assert_eq!(profiles.default_judge().unwrap().model, DEFAULT_JUDGE_MODEL);
    }

    #[test]
    fn test_validate_rejects_duplicate_judges() {
        let mut profiles = Profiles::builtin();
        profiles.judges.push(JudgeConfig::new("default", "other"));
        let err = profiles.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate judge name"));
    }

    #[test]
    fn test_validate_rejects_bad_temperature_and_bounds() {
        let mut judge = JudgeConfig::new("hot", "m");
        judge.temperature = 3.5;
        assert!(judge.validate().is_err());

        let mut judge = JudgeConfig::new("bounded", "m");
        judge.score_type = ScoreKind::Numerical;
        judge.min = Some(5.0);
        judge.max = Some(1.0);
        assert!(judge.validate().is_err());

        let mut judge = JudgeConfig::new("bool-with-max", "m");
        judge.max = Some(1.0);
        assert!(judge.validate().is_err());
    }

    #[test]
    fn test_validate_jury_incompatible_voting() {
        let mut profiles = Profiles::builtin();
        profiles.jury = Some(JuryConfig {
            judges: vec!["default".into()],
            voting: VotingMethod::Average,
            weights: None,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        });
        let err = profiles.validate().unwrap_err();
        assert!(matches!(err, JudgeError::Configuration(_)));
    }

    #[test]
    fn test_validate_jury_unknown_judge() {
        let mut profiles = Profiles::builtin();
        profiles.jury = Some(JuryConfig {
            judges: vec!["default".into(), "ghost".into()],
            voting: VotingMethod::Majority,
            weights: None,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        });
        let err = profiles.validate().unwrap_err();
        assert!(err.to_string().contains("unknown judge 'ghost'"));
    }

    #[test]
    fn test_chat_candidate_requires_model() {
        let mut profiles = Profiles::builtin();
        profiles.candidates.push(CandidateConfig {
            kind: CandidateKind::Chat,
            ..CandidateConfig::recorded("chat")
        });
        assert!(profiles.validate().is_err());
    }

    #[test]
    fn test_judge_config_build() {
        let mut config = JudgeConfig::new("scorer", "gpt-4o");
        config.score_type = ScoreKind::Numerical;
        config.max = Some(10.0);
        let judge = config.build(scripted()).unwrap();
        assert_eq!(judge.name(), "scorer");
        assert_eq!(judge.score_type().to_string(), "numerical [0, 10]");
    }

    #[test]
    fn test_unknown_judge_is_usage_error() {
        let err = Profiles::builtin().judge("nope").unwrap_err();
        assert!(matches!(err, JudgeError::UsageError(_)));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let backend = BackendConfig {
            api_key: Some("sk-test".into()),
            api_key_env: Some("MCP_JUDGE_TEST_UNSET_VAR".into()),
            ..BackendConfig::default()
        };
        assert_eq!(backend.api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_named_env_var_must_exist() {
        let backend = BackendConfig {
            api_key_env: Some("MCP_JUDGE_TEST_DEFINITELY_UNSET".into()),
            ..BackendConfig::default()
        };
        let err = backend.api_key().unwrap_err();
        assert!(err.to_string().contains("MCP_JUDGE_TEST_DEFINITELY_UNSET"));
    }
}
