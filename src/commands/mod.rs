//! CLI commands for mcp-judge

pub mod dispatch;
pub mod env_file;
pub mod evaluate;
pub mod history;
pub mod questions;
pub mod render;
pub mod test;
