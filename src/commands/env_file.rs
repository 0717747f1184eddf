//! `.env` loading
//!
//! Runs before the async runtime starts, while the process is still
//! single-threaded.

use std::fs;
use std::path::Path;

use mcp_judge_core::error::{JudgeError, Result};

const DEFAULT_ENV_FILE: &str = ".env";

/// Load `path`, or `./.env` when no path is given and the file exists.
///
/// Variables already set in the environment win. Returns the number of
/// variables set.
pub fn load(path: Option<&Path>) -> Result<usize> {
    let path = match path {
        Some(path) if !path.exists() => {
            return Err(JudgeError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Some(path) => path,
        None => {
            let default = Path::new(DEFAULT_ENV_FILE);
            if !default.exists() {
                return Ok(0);
            }
            default
        }
    };

    let content = fs::read_to_string(path)?;
    let mut loaded = 0;
    for (key, value) in parse(&content) {
        if env_is_unset(&key) {
            std::env::set_var(&key, value);
            loaded += 1;
        }
    }

    tracing::debug!(path = %path.display(), loaded, "env_file_loaded");
    Ok(loaded)
}

fn env_is_unset(key: &str) -> bool {
    std::env::var_os(key).is_none()
}

/// Parse `KEY=VALUE` lines. Blank lines, `#` comments and lines without `=`
/// are skipped; an `export ` prefix and matching outer quotes are removed.
pub fn parse(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_lines() {
        let parsed = parse(
            "# keys\nOPENAI_API_KEY=sk-123\nexport MCP_JUDGE_LOG=debug\n\nQUOTED=\"a b\"\nSINGLE='x'\nnot a pair\n=novalue\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("OPENAI_API_KEY".to_string(), "sk-123".to_string()),
                ("MCP_JUDGE_LOG".to_string(), "debug".to_string()),
                ("QUOTED".to_string(), "a b".to_string()),
                ("SINGLE".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_value_may_contain_equals() {
        let parsed = parse("URL=http://host/?a=b");
        assert_eq!(parsed[0].1, "http://host/?a=b");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = load(Some(Path::new("/nonexistent/.env"))).unwrap_err();
        assert!(matches!(err, JudgeError::FileNotFound { .. }));
    }
}
