//! Logging init: `[LEVEL] message` lines on stderr, plus a file under the XDG state dir.
//!
//! Stdout is reserved for the single report line, so no layer ever writes there.

use anyhow::Result;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Renders an event as `[INFO] message`, the format operators grep for.
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketLevel;

impl<S, N> FormatEvent<S, N> for BracketLevel
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
        write!(writer, "[{}] ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Writer that is either the log file or a sink (used when file clone fails).
enum FileOrSink {
    File(fs::File),
    Sink,
}

impl io::Write for FileOrSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrSink::File(f) => f.write(buf),
            FileOrSink::Sink => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrSink::File(f) => f.flush(),
            FileOrSink::Sink => Ok(()),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrSink::File)
            .unwrap_or(FileOrSink::Sink)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("jmpdf")?;
    let log_dir = xdg_dirs.get_state_home().join("jmpdf");
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir.join("jmpdf.log"))
}

/// Initialize logging to stderr and `~/.local/state/jmpdf/jmpdf.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let log_file_path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(BoxMakeWriter::new(FileMakeWriter(file)))
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(BracketLevel)
        .with_writer(io::stderr)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!("jmpdf logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only. Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(BracketLevel)
        .with_writer(io::stderr)
        .with_ansi(false);
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .try_init();
}
