//! CLI argument parsing for mcp-judge
//!
//! Global flags: --format, --quiet, --verbose, --env-file, --log-level, --log-json

pub mod args;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{EvaluateArgs, HistoryArgs, QuestionsArgs, TestArgs, Weights};
pub use output::OutputFormat;

/// MCP Judge - benchmark MCP tool usage with LLM judges
#[derive(Parser, Debug)]
#[command(name = "mcp-judge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Show per-question progress and debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Load KEY=VALUE environment variables from this file (default: ./.env if present)
    #[arg(long, global = true, env = "MCP_JUDGE_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Log filter (e.g. "debug" or "mcp_judge_core=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate candidate answers for a questions file
    Evaluate(EvaluateArgs),

    /// List the questions in a questions file
    Questions(QuestionsArgs),

    /// Run one built-in evaluation to check the judge setup
    Test(TestArgs),

    /// Show previous runs
    History(HistoryArgs),
}
