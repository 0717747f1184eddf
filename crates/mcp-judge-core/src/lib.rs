//! MCP Judge Core Library
//!
//! Judge and jury scoring for MCP tool-usage benchmarks: typed verdicts,
//! single-judge evaluation, multi-judge voting, and the runner that drives
//! candidates through a question fixture.

pub mod backend;
pub mod cancel;
pub mod candidate;
pub mod config;
pub mod error;
pub mod fixture;
pub mod judge;
pub mod jury;
pub mod logging;
pub mod report;
pub mod runner;
pub mod score;
pub mod verdict;
