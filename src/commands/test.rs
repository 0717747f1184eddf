//! `mcp-judge test` - score one built-in answer to check the judge setup

use std::sync::Arc;

use crate::cli::TestArgs;
use crate::commands::dispatch::CommandContext;
use mcp_judge_core::backend::{Backend, ScriptedBackend};
use mcp_judge_core::config::Profiles;
use mcp_judge_core::error::Result;
use mcp_judge_core::fixture::Question;
use mcp_judge_core::runner::Evaluator;

/// A file-listing question answered with the expected tool
pub fn sample_question() -> Question {
    let mut parameters = serde_json::Map::new();
    parameters.insert("path".to_string(), serde_json::json!("/some/directory"));

    Question {
        expected_tools: vec!["file_browser".to_string()],
        expected_parameters: parameters,
        answer: Some("You can use the `ls` command to list files in a directory.".to_string()),
        reference_answer: Some(
            "Use the `ls` command or the file browser tool to list directory contents."
                .to_string(),
        ),
        ..Question::new("How do I list files in a directory?")
    }
}

pub fn execute(ctx: &CommandContext, args: &TestArgs) -> Result<()> {
    let profiles = Profiles::load_or_default(args.profiles.as_deref())?;
    profiles.validate()?;

    let config = match &args.judge {
        Some(name) => profiles.judge(name)?,
        None => profiles.default_judge()?,
    };
    let backend: Arc<dyn Backend> = if args.dry_run {
        Arc::new(ScriptedBackend::dry_run(&config.score_type()?))
    } else {
        profiles.backend.build()?
    };
    let evaluator = Evaluator::Judge {
        judge: config.build(backend)?,
        pass_threshold: config.pass_threshold,
    };

    let question = sample_question();
    let answer = question.answer.clone().unwrap_or_default();
    let evaluation = ctx.block_on(evaluator.evaluate(&question.request(&answer), &ctx.cancellation))?;
    let verdict = evaluation.verdict;
    let passed = verdict.passed(evaluator.pass_threshold());

    if ctx.json() {
        let output = serde_json::json!({
            "evaluator": evaluator.describe(),
            "question": question.question,
            "answer": answer,
            "score": verdict.score(),
            "passed": passed,
            "reasoning": verdict.reasoning(),
            "raw_result": verdict.raw_result(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Evaluator: {}", evaluator.describe());
    println!("Question: {}", question.question);
    println!("Answer: {}", answer);
    println!("Score: {}", verdict.score());
    println!("Passed: {}", if passed { "yes" } else { "no" });
    println!("Reasoning: {}", verdict.reasoning());
    Ok(())
}
