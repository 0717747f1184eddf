//! Result export and run history.
//!
//! The export is a JSON object mapping each candidate model to its per-question
//! results. The history is an append-only `results.jsonl` log with one summary
//! record per run.

use crate::error::{JudgeError, Result};
use crate::runner::{RunReport, RunSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Build the `model -> [result, ...]` export document
pub fn export_value(report: &RunReport) -> Result<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for run in &report.runs {
        map.insert(run.model.clone(), serde_json::to_value(&run.results)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Write the export document, pretty-printed
pub fn write_export(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&export_value(report)?)?;
    fs::write(path, content)?;
    tracing::debug!(path = %path.display(), "results_exported");
    Ok(())
}

/// Identifier for a run, derived from the current time
pub fn generate_run_id() -> String {
    let now = Utc::now();
    format!("run-{}", now.format("%Y%m%d-%H%M%S-%f"))
}

/// One line of the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    /// Judge or jury description
    pub evaluator: String,
    /// Questions fixture the run used
    pub questions_file: String,
    pub summaries: Vec<HistorySummary>,
    #[serde(default)]
    pub cancelled: bool,
}

/// Per-model counts stored in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub model: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub success_rate: f64,
}

impl From<RunSummary> for HistorySummary {
    fn from(summary: RunSummary) -> Self {
        Self {
            model: summary.model,
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            errored: summary.errored,
            success_rate: summary.success_rate,
        }
    }
}

impl RunRecord {
    pub fn from_report(report: &RunReport, questions_file: &Path) -> Self {
        Self {
            run_id: generate_run_id(),
            timestamp: Utc::now(),
            evaluator: report.evaluator.clone(),
            questions_file: questions_file.display().to_string(),
            summaries: report
                .runs
                .iter()
                .map(|run| run.summary().into())
                .collect(),
            cancelled: report.cancelled,
        }
    }
}

/// Append-only JSONL run history
pub struct ResultsDb {
    results_path: PathBuf,
}

impl ResultsDb {
    pub fn new(results_dir: &Path) -> Self {
        Self {
            results_path: results_dir.join("results.jsonl"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.results_path
    }

    pub fn append(&self, record: &RunRecord) -> Result<()> {
        if let Some(parent) = self.results_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_path)?;

        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Every record, oldest first. Missing history is empty history.
    pub fn load_all(&self) -> Result<Vec<RunRecord>> {
        if !self.results_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.results_path)?);
        let mut records = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RunRecord = serde_json::from_str(&line).map_err(|e| {
                JudgeError::Other(format!(
                    "failed to parse {} line {}: {}",
                    self.results_path.display(),
                    number + 1,
                    e
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn load_by_id(&self, run_id: &str) -> Result<Option<RunRecord>> {
        Ok(self.load_all()?.into_iter().find(|r| r.run_id == run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{ModelRun, QuestionResult};
    use crate::score::{Likert, Score};
    use tempfile::tempdir;

    fn report() -> RunReport {
        RunReport {
            evaluator: "judge default (gpt-4o-mini, boolean)".into(),
            runs: vec![ModelRun {
                model: "gpt-4o".into(),
                results: vec![
                    QuestionResult {
                        question_index: 0,
                        question: "List files".into(),
                        generated_answer: Some("Called file_browser(path=/tmp)".into()),
                        expected_tools: vec!["file_browser".into()],
                        expected_parameters: serde_json::Map::from_iter([(
                            "path".to_string(),
                            serde_json::json!("/tmp"),
                        )]),
                        score: Some(Score::Likert(Likert::Good)),
                        reasoning: "Used file_browser".into(),
                        passed: true,
                        error: false,
                        raw_result: Some(r#"{"score": "good"}"#.into()),
                        judgments: None,
                    },
                    QuestionResult {
                        question_index: 1,
                        question: "Other".into(),
                        generated_answer: None,
                        expected_tools: Vec::new(),
                        expected_parameters: serde_json::Map::new(),
                        score: None,
                        reasoning: "Evaluation error: timeout".into(),
                        passed: false,
                        error: true,
                        raw_result: None,
                        judgments: None,
                    },
                ],
            }],
            cancelled: false,
        }
    }

    #[test]
    fn test_export_shape() {
        let value = export_value(&report()).unwrap();
        let rows = value["gpt-4o"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["score"], "good");
        assert_eq!(rows[0]["passed"], true);
        assert!(rows[0].get("error").is_none());
        assert!(rows[0].get("judgments").is_none());
        assert_eq!(rows[0]["generated_answer"], "Called file_browser(path=/tmp)");
        assert_eq!(rows[0]["expected_tools"], serde_json::json!(["file_browser"]));
        assert_eq!(rows[0]["expected_parameters"], serde_json::json!({"path": "/tmp"}));
        assert_eq!(rows[0]["raw_result"], r#"{"score": "good"}"#);
        assert_eq!(rows[1]["score"], serde_json::Value::Null);
        assert_eq!(rows[1]["error"], true);
        assert!(rows[1].get("generated_answer").is_none());
        assert!(rows[1].get("raw_result").is_none());
        assert_eq!(rows[1]["expected_tools"], serde_json::json!([]));
    }

    #[test]
    fn test_write_export_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/results.json");
        write_export(&report(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value.get("gpt-4o").is_some());
    }

    #[test]
    fn test_history_append_and_load() {
        let dir = tempdir().unwrap();
        let db = ResultsDb::new(&dir.path().join("results"));
        assert!(db.load_all().unwrap().is_empty());

        let record = RunRecord::from_report(&report(), Path::new("questions.json"));
        db.append(&record).unwrap();
        db.append(&RunRecord {
            run_id: "run-second".into(),
            ..record.clone()
        })
        .unwrap();

        let records = db.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].summaries[0].passed, 1);
        assert_eq!(records[0].summaries[0].errored, 1);
        assert_eq!(records[0].summaries[0].success_rate, 50.0);

        let found = db.load_by_id("run-second").unwrap().unwrap();
        assert_eq!(found.questions_file, "questions.json");
        assert!(db.load_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_run_id_format() {
        assert!(generate_run_id().starts_with("run-"));
    }
}
