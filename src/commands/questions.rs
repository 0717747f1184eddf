//! `mcp-judge questions` - list the questions in a fixture file

use crate::cli::QuestionsArgs;
use crate::commands::dispatch::CommandContext;
use mcp_judge_core::error::Result;
use mcp_judge_core::fixture::load_questions;

pub fn execute(ctx: &CommandContext, args: &QuestionsArgs) -> Result<()> {
    let questions = load_questions(&args.questions_file)?;

    if ctx.json() {
        let listing: Vec<_> = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                serde_json::json!({
                    "index": i + 1,
                    "question": q.question,
                    "expected_tools": q.expected_tools,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for (i, question) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, question.question);
        if ctx.cli.verbose && !question.expected_tools.is_empty() {
            println!("   tools: {}", question.expected_tools.join(", "));
        }
    }
    if questions.is_empty() && !ctx.cli.quiet {
        println!("No questions in {}", args.questions_file.display());
    }
    Ok(())
}
