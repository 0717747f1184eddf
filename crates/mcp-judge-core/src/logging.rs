use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Helper macro for logging elapsed time at trace level.
///
/// Usage:
/// ```rust,ignore
/// let start = Instant::now();
/// // ... some work ...
/// trace_time!(start, "operation_name");
/// // Or with additional fields:
/// trace_time!(start, "operation_name", judge = judge.name());
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $name:expr) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $name);
    };
    ($start:expr, $name:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $($field = $value),*, $name);
    };
}

/// Initialize structured logging based on CLI arguments
///
/// Filter order: `--log-level`, then `RUST_LOG`, then `MCP_JUDGE_LOG`,
/// then the verbose default.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let directive = resolve_directive(verbose, log_level, |key| std::env::var(key).ok());
    init_with_filter(EnvFilter::try_new(directive)?, log_json)
}

/// Pick the filter directive; unparsable environment values are skipped
fn resolve_directive(
    verbose: bool,
    log_level: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    if let Some(level) = log_level {
        return filter_directive(level);
    }

    let from_env = ["RUST_LOG", "MCP_JUDGE_LOG"]
        .into_iter()
        .filter_map(|key| env(key))
        .find(|value| !value.trim().is_empty() && EnvFilter::try_new(value).is_ok());
    if let Some(value) = from_env {
        return value;
    }

    if verbose {
        filter_directive("debug")
    } else {
        filter_directive("warn")
    }
}

/// Expand a bare level (`info`) into a filter covering both crates
fn filter_directive(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("mcp_judge={level},mcp_judge_core={level}")
    }
}

fn init_with_filter(filter: EnvFilter, log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_span_events(
                        tracing_subscriber::fmt::format::FmtSpan::NEW
                            | tracing_subscriber::fmt::format::FmtSpan::CLOSE,
                    ),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
