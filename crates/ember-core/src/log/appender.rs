//! Appenders and the sinks they write to.

use super::format::PatternFormatter;
use super::record::LogRecord;
use crate::util::fs::expand_path;
use ember_types::{bail, AppenderDefinition, AppenderKind, EmberError, LogLevel, Result};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Destination for rendered log text.
pub trait LogSink: Send + Sync {
    /// Write one rendered record.
    fn write(&self, text: &str) -> Result<()>;

    /// Close and reopen the underlying resource. Returns `true` on success.
    fn reopen(&self) -> bool {
        true
    }

    /// Document name of the sink kind, e.g. `StdoutLogAppender`.
    fn kind(&self) -> &str;

    /// Target path, for file-backed sinks.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Last open/write failure, if the sink is currently unusable.
    fn last_error(&self) -> Option<String> {
        None
    }
}

/// Standard output, flushed after every record.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn kind(&self) -> &str {
        AppenderKind::Stdout.as_str()
    }
}

/// A file opened for appending.
///
/// Failing to open the file does not fail construction: the sink keeps the
/// error, rejects writes, and can be retried with [`LogSink::reopen`].
///
/// [`LogSink::path`] reports the path as declared (`~/app.log`); writes go
/// to the [`resolved`](Self::resolved) one.
#[derive(Debug)]
pub struct FileSink {
    declared: PathBuf,
    path: PathBuf,
    file: Mutex<Option<File>>,
    last_error: Mutex<Option<String>>,
}

impl FileSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let sink = Self::unopened(path);
        sink.reopen();
        sink
    }

    fn unopened(path: impl AsRef<Path>) -> Self {
        let declared = path.as_ref().to_path_buf();
        Self {
            path: expand_path(&declared),
            declared,
            file: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Path the file is actually written to, with `~` expanded.
    pub fn resolved(&self) -> &Path {
        &self.path
    }

    fn open_file(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path)
    }
}

impl LogSink for FileSink {
    fn write(&self, text: &str) -> Result<()> {
        let mut guard = self.file.lock();
        let Some(file) = guard.as_mut() else {
            let reason = self
                .last_error
                .lock()
                .clone()
                .unwrap_or_else(|| "not open".to_string());
            return Err(EmberError::Sink(format!("{:?}: {}", self.path, reason)));
        };
        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| EmberError::Sink(format!("{:?}: {}", self.path, e)))
    }

    fn reopen(&self) -> bool {
        let mut guard = self.file.lock();
        if let Some(mut old) = guard.take() {
            if let Err(e) = old.flush() {
                warn!("Failed to flush {:?} before reopen: {}", self.path, e);
            }
        }

        match Self::open_file(&self.path) {
            Ok(file) => {
                debug!("Opened log file {:?}", self.path);
                *guard = Some(file);
                *self.last_error.lock() = None;
                true
            }
            Err(e) => {
                error!("Failed to open log file {:?}: {}", self.path, e);
                *self.last_error.lock() = Some(e.to_string());
                false
            }
        }
    }

    fn kind(&self) -> &str {
        AppenderKind::File.as_str()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.declared)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

/// In-memory buffer, for previews and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Mutex<String>,
}

impl MemorySink {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Drain the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock())
    }
}

impl LogSink for MemorySink {
    fn write(&self, text: &str) -> Result<()> {
        self.buffer.lock().push_str(text);
        Ok(())
    }

    fn kind(&self) -> &str {
        "MemoryLogAppender"
    }
}

/// Formatter used by appenders that were never given one.
pub const FALLBACK_PATTERN: &str = "%d%T[%p]%T[%c]%T%m%n";

static FALLBACK_FORMATTER: Lazy<Arc<PatternFormatter>> =
    Lazy::new(|| Arc::new(PatternFormatter::new(FALLBACK_PATTERN)));

struct FormatterSlot {
    formatter: Option<Arc<PatternFormatter>>,
    // Set explicitly rather than adopted from a logger.
    own: bool,
}

/// Renders records with a formatter and writes them to a sink.
///
/// Appenders are shared: the same `Arc<LogAppender>` may be attached to
/// several loggers.
pub struct LogAppender {
    sink: Arc<dyn LogSink>,
    level: RwLock<LogLevel>,
    formatter: RwLock<FormatterSlot>,
}

impl LogAppender {
    /// Appender over an arbitrary sink.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            level: RwLock::new(LogLevel::All),
            formatter: RwLock::new(FormatterSlot {
                formatter: None,
                own: false,
            }),
        }
    }

    /// Shared console appender.
    pub fn stdout() -> Arc<Self> {
        Arc::new(Self::new(Arc::new(StdoutSink)))
    }

    /// Shared file appender. Check [`sink_error`](Self::sink_error) to see
    /// whether the file could be opened.
    pub fn file(path: impl AsRef<Path>) -> Arc<Self> {
        Arc::new(Self::new(Arc::new(FileSink::open(path))))
    }

    /// Build an appender from its declaration, without any formatter.
    pub fn from_definition(def: &AppenderDefinition) -> Result<Arc<Self>> {
        match def.kind.parse::<AppenderKind>()? {
            AppenderKind::Stdout => Ok(Self::stdout()),
            AppenderKind::File => match def.file.as_deref() {
                Some(path) if !path.trim().is_empty() => Ok(Self::file(path)),
                _ => bail!(Conversion, "FileLogAppender requires a 'file' path"),
            },
        }
    }

    /// Threshold below which records are ignored.
    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    /// Set the threshold.
    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    /// Current formatter, if any.
    pub fn formatter(&self) -> Option<Arc<PatternFormatter>> {
        self.formatter.read().formatter.clone()
    }

    /// Give this appender its own formatter.
    pub fn set_formatter(&self, formatter: Arc<PatternFormatter>) {
        let mut slot = self.formatter.write();
        slot.formatter = Some(formatter);
        slot.own = true;
    }

    /// Whether a formatter was set explicitly.
    pub fn has_own_formatter(&self) -> bool {
        self.formatter.read().own
    }

    /// Use `formatter` only if this appender has none yet.
    pub(crate) fn adopt_formatter(&self, formatter: Arc<PatternFormatter>) {
        let mut slot = self.formatter.write();
        if slot.formatter.is_none() {
            slot.formatter = Some(formatter);
        }
    }

    /// Underlying sink.
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Why the sink is unusable, if it is.
    pub fn sink_error(&self) -> Option<String> {
        self.sink.last_error()
    }

    /// Reopen the sink (e.g. after log rotation).
    pub fn reopen(&self) -> bool {
        self.sink.reopen()
    }

    /// Render and write `record` if `level` passes this appender's threshold.
    pub fn append(&self, level: LogLevel, record: &LogRecord) -> Result<()> {
        if level < self.level() {
            return Ok(());
        }
        let formatter = self
            .formatter()
            .unwrap_or_else(|| FALLBACK_FORMATTER.clone());
        self.sink.write(&formatter.format(level, record))
    }

    /// Declarative snapshot of this appender.
    pub fn definition(&self) -> AppenderDefinition {
        let slot = self.formatter.read();
        AppenderDefinition {
            kind: self.sink.kind().to_string(),
            file: self.sink.path().map(|p| p.display().to_string()),
            pattern: slot
                .formatter
                .as_ref()
                .filter(|_| slot.own)
                .map(|f| f.pattern().to_string()),
        }
    }
}

impl std::fmt::Debug for LogAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogAppender")
            .field("kind", &self.sink.kind())
            .field("path", &self.sink.path())
            .field("level", &self.level())
            .finish()
    }
}
