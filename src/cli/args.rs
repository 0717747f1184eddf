use clap::Args;
use mcp_judge_core::jury::VotingMethod;
use std::path::PathBuf;

fn parse_voting_method(s: &str) -> Result<VotingMethod, String> {
    s.parse().map_err(|e: mcp_judge_core::error::JudgeError| e.to_string())
}

/// Comma-separated jury weights
#[derive(Debug, Clone, PartialEq)]
pub struct Weights(pub Vec<f64>);

fn parse_weights(s: &str) -> Result<Weights, String> {
    s.split(',')
        .map(|w| {
            w.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid weight '{}'", w.trim()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Weights)
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Path to the questions JSON file
    pub questions_file: PathBuf,

    /// Profiles file (YAML or TOML; default: ./mcp-judge.yaml or built-in judge)
    #[arg(long, short = 'p')]
    pub profiles: Option<PathBuf>,

    /// Judge to use; repeat to form a jury
    #[arg(long, short = 'j', action = clap::ArgAction::Append)]
    pub judge: Vec<String>,

    /// Use the jury from the profiles file
    #[arg(long)]
    pub jury: bool,

    /// Voting method for the jury (majority, average, weighted_average, median)
    #[arg(long, value_parser = parse_voting_method)]
    pub voting: Option<VotingMethod>,

    /// Comma-separated jury weights, one per judge
    #[arg(long, value_parser = parse_weights)]
    pub weights: Option<Weights>,

    /// Candidate to evaluate; repeat for several (default: all in profiles)
    #[arg(long, short = 'c', action = clap::ArgAction::Append)]
    pub candidate: Vec<String>,

    /// Question indices to run, e.g. "1,3,5" or "all"
    #[arg(long, default_value = "all", allow_hyphen_values = true)]
    pub questions: String,

    /// Write the results JSON here
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Directory holding the run history
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Score with a local scripted backend; no network calls, no history
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QuestionsArgs {
    /// Path to the questions JSON file
    pub questions_file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Profiles file (YAML or TOML)
    #[arg(long, short = 'p')]
    pub profiles: Option<PathBuf>,

    /// Judge to test (default: first judge in profiles)
    #[arg(long, short = 'j')]
    pub judge: Option<String>,

    /// Score with a local scripted backend; no network calls
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Directory holding the run history
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Show only the most recent N runs
    #[arg(long, short = 'n', conflicts_with = "run")]
    pub limit: Option<usize>,

    /// Show a single run by id
    #[arg(long)]
    pub run: Option<String>,
}
