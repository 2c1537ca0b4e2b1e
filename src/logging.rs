//! Console and file logging setup

use crate::cli::Args;
use anyhow::{anyhow, Context, Result};
use colored::*;
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Console formatter that colors each whole line by level
///
/// Only the message fields are printed: no timestamp, level, or target.
/// Progress lines from the executors read as plain status output this way.
pub struct ColorizedFormatter;

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Fields are buffered so the color applies to the full line.
        let mut buffer = String::new();
        ctx.format_fields(Writer::new(&mut buffer), event)?;

        let colored_output = match *event.metadata().level() {
            Level::INFO => buffer.normal(),
            Level::WARN => buffer.yellow(),
            Level::ERROR => buffer.red(),
            Level::DEBUG => buffer.blue(),
            Level::TRACE => buffer.purple(),
        };

        writeln!(writer, "{}", colored_output)
    }
}

/// Console level for the verbosity flags; `--quiet` wins over `-v`
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Filter used when `RUST_LOG` is not set
///
/// Dependencies stay at `warn` so `-vv` does not flood the console with
/// HTTP client internals.
fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,{}={}",
        env!("CARGO_CRATE_NAME"),
        level.to_string().to_lowercase()
    ))
}

/// Install the global subscriber
///
/// Console output goes to stderr through `ColorizedFormatter`. With
/// `--log-file`, a plain-text copy with timestamps and levels is written
/// through a non-blocking appender; the returned guard must be held until
/// exit so buffered lines are flushed.
pub fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(level_for(args.verbose, args.quiet)));

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(ColorizedFormatter)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install logging subscriber")?;

    Ok(guard)
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    if path.file_name().is_none() {
        return Err(anyhow!("Log file path has no file name: {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    Ok(tracing_appender::non_blocking(file))
}
