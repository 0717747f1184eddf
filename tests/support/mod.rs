use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};

/// Get a Command for mcp-judge, isolated from the caller's environment
pub fn mcp_judge() -> Command {
    let mut cmd = cargo_bin_cmd!("mcp-judge");
    cmd.env_remove("MCP_JUDGE_ENV_FILE")
        .env_remove("MCP_JUDGE_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

pub const QUESTIONS: &str = r#"[
  {
    "question": "How do I list files in a directory?",
    "expected_tools": ["file_browser"],
    "expected_parameters": {"path": "/some/directory"},
    "answer": "Called file_browser(path=/some/directory)"
  },
  {
    "question": "What is the weather in Paris?",
    "expected_tools": ["weather"],
    "answer": "It is sunny."
  },
  {
    "question": "Summarize the open issues in the repository",
    "expected_tools": ["github_search", "summarize"],
    "tools_ordered": true
  }
]"#;

/// Write the three-question fixture into `dir`
pub fn write_questions(dir: &Path) -> PathBuf {
    let path = dir.join("questions.json");
    fs::write(&path, QUESTIONS).unwrap();
    path
}

/// Profiles with three judges of different score types and a likert jury
#[allow(dead_code)]
pub fn write_profiles(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("mcp-judge.yaml");
    let content = format!(
        r#"
backend:
  base_url: {base_url}
  api_key: test-key
judges:
  - name: strict
    model: gpt-4o
    score_type: boolean
  - name: rater-a
    model: gpt-4o-mini
    score_type: likert
  - name: rater-b
    model: gpt-4o-mini
    score_type: likert
    timeout_secs: 5
jury:
  judges: [rater-a, rater-b]
  voting: median
candidates:
  - name: recorded
    kind: recorded
"#
    );
    fs::write(&path, content).unwrap();
    path
}
