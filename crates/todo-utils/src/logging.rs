//! Structured logging for todo-engine.
//!
//! A compact/verbose tracing split; the core never prints ANSI escapes or
//! glyphs itself — that is the CLI's job.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `verbose` selects a structured format including spans for mutator
/// transactions; otherwise a compact human-readable format is used.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("todo_engine=debug,info")
            } else {
                EnvFilter::try_new("todo_engine=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Create a span for a mutator transaction (lock → validate → mutate →
/// write → audit) with structured fields for correlation.
pub fn mutator_span(action: &str, task_id: Option<&str>) -> tracing::Span {
    tracing::span!(
        tracing::Level::INFO,
        "mutator",
        action = action,
        task_id = task_id.unwrap_or("")
    )
}
