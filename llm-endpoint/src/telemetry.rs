use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefixes of the crates in this workspace.
pub const TARGET_PREFIXES: &[&str] = &["llm_endpoint", "chat_chain", "chat_cli", "kendra_chat"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // No fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Build a **workspace-scoped** formatting layer that renders only events
/// emitted by this workspace's crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - Span close events (duration at the end of spans)
/// - Written to **stderr**, so logs never interleave with chat output on stdout
/// - ANSI colors only when stderr is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stderr().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(use_ansi)
        // Log span close to get durations for instrumented functions
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(
            fmt::format()
                .compact()
                .with_timer(ChronoRfc3339Utc)
                .with_level(true)
                .with_target(true)
                .with_source_location(true),
        )
        .with_filter(only_workspace)
}

/// Level directive for a single crate target.
/// Example: `level_directive("chat_chain", Level::DEBUG)` → `chat_chain=debug`.
pub fn level_directive(target: &str, level: Level) -> Directive {
    let s = format!("{target}={}", level.as_str().to_lowercase());
    // Targets are crate identifiers and levels come from `Level`, so this parses.
    Directive::from_str(&s).unwrap_or_else(|_| LevelFilter::INFO.into())
}

/// `EnvFilter` from `RUST_LOG`, or `default` plus `level` for every workspace
/// crate when `RUST_LOG` is unset.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => TARGET_PREFIXES
            .iter()
            .fold(EnvFilter::new(default), |f, t| {
                f.add_directive(level_directive(t, level))
            }),
    }
}

/// Installs the global subscriber: env filter + workspace layer.
///
/// # Errors
/// [`TryInitError`] if a global subscriber was already set.
pub fn init(default: &str, level: Level) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter_with_level(default, level))
        .with(layer())
        .try_init()
}
