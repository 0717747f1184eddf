//! `mcp-judge history` - show previous runs

use crate::cli::HistoryArgs;
use crate::commands::dispatch::CommandContext;
use crate::commands::render;
use mcp_judge_core::error::{JudgeError, Result};
use mcp_judge_core::report::ResultsDb;

pub fn execute(ctx: &CommandContext, args: &HistoryArgs) -> Result<()> {
    let db = ResultsDb::new(&args.results_dir);
    if let Some(run_id) = &args.run {
        return show_run(ctx, &db, run_id);
    }

    let mut records = db.load_all()?;

    if let Some(limit) = args.limit {
        let skip = records.len().saturating_sub(limit);
        records = records.split_off(skip);
    }

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        if !ctx.cli.quiet {
            println!("No runs recorded in {}", db.path().display());
        }
        return Ok(());
    }

    render::print_history(&records);
    Ok(())
}

fn show_run(ctx: &CommandContext, db: &ResultsDb, run_id: &str) -> Result<()> {
    let record = db.load_by_id(run_id)?.ok_or_else(|| {
        JudgeError::UsageError(format!("no run '{}' in {}", run_id, db.path().display()))
    })?;

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        render::print_record(&record);
    }
    Ok(())
}
