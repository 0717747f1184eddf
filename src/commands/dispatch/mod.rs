//! Command dispatch for mcp-judge

use std::time::Instant;

use crate::cli::Cli;
use mcp_judge_core::cancel::Cancellation;
use mcp_judge_core::error::Result;
use tracing::debug;

mod command;
mod commands;

pub use command::CommandContext;
use command::{Command, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let cancellation = Cancellation::new();
    let handle = cancellation.clone();
    let _ = ctrlc::set_handler(move || {
        handle.cancel();
    });

    debug!(elapsed = ?start.elapsed(), "runtime_ready");

    let ctx = CommandContext::new(cli, start, &runtime, cancellation);

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}
