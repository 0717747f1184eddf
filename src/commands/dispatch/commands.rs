//! Command implementations for all mcp-judge commands

use crate::cli::Commands;
use crate::commands::dispatch::command::{Command, CommandContext};
use mcp_judge_core::error::Result;

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let result = match self {
            Commands::Evaluate(args) => crate::commands::evaluate::execute(ctx, args),
            Commands::Questions(args) => crate::commands::questions::execute(ctx, args),
            Commands::Test(args) => crate::commands::test::execute(ctx, args),
            Commands::History(args) => crate::commands::history::execute(ctx, args),
        };
        tracing::debug!(elapsed = ?ctx.start.elapsed(), ok = result.is_ok(), "command_finished");
        result
    }
}
