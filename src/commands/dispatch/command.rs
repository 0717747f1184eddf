//! Command trait and context for dispatching commands

use std::future::Future;
use std::time::Instant;

use crate::cli::{Cli, OutputFormat};
use mcp_judge_core::cancel::Cancellation;
use mcp_judge_core::error::Result;
use tokio::runtime::Runtime;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub start: Instant,
    pub cancellation: Cancellation,
    runtime: &'a Runtime,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, start: Instant, runtime: &'a Runtime, cancellation: Cancellation) -> Self {
        Self {
            cli,
            start,
            cancellation,
            runtime,
        }
    }

    /// Drive a future to completion on the command runtime
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn json(&self) -> bool {
        self.cli.format == OutputFormat::Json
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("mcp-judge {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Benchmark MCP tool usage with LLM judges and juries.");
        println!();
        println!("Run `mcp-judge --help` for usage information.");
        Ok(())
    }
}
