//! Log pattern compiler.
//!
//! A pattern mixes literal text with `%` directives. Each directive is one
//! character, optionally followed by a `{argument}` block:
//!
//! | Directive | Renders                                         |
//! |-----------|-------------------------------------------------|
//! | `%m`      | message                                         |
//! | `%p`      | level name                                      |
//! | `%r`      | milliseconds since logging started              |
//! | `%t`      | thread id                                       |
//! | `%N`      | thread name                                     |
//! | `%F`      | fiber/task id                                   |
//! | `%c`      | logger name                                     |
//! | `%n`      | newline                                         |
//! | `%T`      | tab                                             |
//! | `%d{fmt}` | timestamp, strftime `fmt` (`%Y-%m-%d %H:%M:%S`) |
//! | `%f`      | source file                                     |
//! | `%l`      | source line                                     |
//! | `%%`      | a literal `%`                                   |
//!
//! Unknown directives render `<<error_format %X>>` in place. An unterminated
//! `{` marks the formatter as errored and renders `<<pattern_error>>`; the
//! rest of the pattern still works.

use super::record::LogRecord;
use crate::time::{is_valid_strftime, write_timestamp, DEFAULT_TIMESTAMP_FORMAT};
use ember_types::{EmberError, LogLevel, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::warn;

/// Marker rendered where a `{` is never closed.
pub const PATTERN_ERROR_MARKER: &str = "<<pattern_error>>";

/// One piece of a rendered record.
pub trait Renderer: Send + Sync {
    /// Append this renderer's output for `record` to `out`.
    fn render(&self, out: &mut String, level: LogLevel, record: &LogRecord);
}

/// Builds a renderer from a directive's `{argument}` (empty if absent).
pub type RendererFactory = Arc<dyn Fn(&str) -> Box<dyn Renderer> + Send + Sync>;

/// A lexical unit of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    /// Text copied as-is
    Literal(String),
    /// `%x` or `%x{arg}`
    Directive {
        /// Directive character
        letter: char,
        /// Brace argument, empty if none
        arg: String,
    },
    /// `%x{...` with no closing brace
    Unterminated {
        /// Directive character
        letter: char,
        /// Text after the `{`
        arg: String,
    },
}

enum ScanState {
    Literal,
    Bare(char),
    Braced(char, String),
}

/// Split a pattern into tokens.
pub fn tokenize(pattern: &str) -> Vec<FormatToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();
    let mut state = ScanState::Literal;

    loop {
        state = match state {
            ScanState::Literal => match chars.next() {
                None => break,
                Some('%') => match chars.next() {
                    Some('%') | None => {
                        literal.push('%');
                        ScanState::Literal
                    }
                    Some(letter) => {
                        if !literal.is_empty() {
                            tokens.push(FormatToken::Literal(std::mem::take(&mut literal)));
                        }
                        ScanState::Bare(letter)
                    }
                },
                Some(c) => {
                    literal.push(c);
                    ScanState::Literal
                }
            },
            ScanState::Bare(letter) => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    ScanState::Braced(letter, String::new())
                } else {
                    tokens.push(FormatToken::Directive {
                        letter,
                        arg: String::new(),
                    });
                    ScanState::Literal
                }
            }
            ScanState::Braced(letter, mut arg) => match chars.next() {
                Some('}') => {
                    tokens.push(FormatToken::Directive { letter, arg });
                    ScanState::Literal
                }
                Some(c) => {
                    arg.push(c);
                    ScanState::Braced(letter, arg)
                }
                None => {
                    tokens.push(FormatToken::Unterminated { letter, arg });
                    break;
                }
            },
        };
    }

    if !literal.is_empty() {
        tokens.push(FormatToken::Literal(literal));
    }
    tokens
}

/// Directive letter -> renderer factory bindings.
#[derive(Clone, Default)]
pub struct DirectiveTable {
    factories: HashMap<char, RendererFactory>,
}

impl DirectiveTable {
    /// A table with no directives.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard directive set.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register('m', |_| Box::new(MessageRenderer));
        table.register('p', |_| Box::new(LevelRenderer));
        table.register('r', |_| Box::new(ElapsedRenderer));
        table.register('t', |_| Box::new(ThreadIdRenderer));
        table.register('N', |_| Box::new(ThreadNameRenderer));
        table.register('F', |_| Box::new(FiberIdRenderer));
        table.register('c', |_| Box::new(LoggerNameRenderer));
        table.register('n', |_| Box::new(LiteralRenderer::new("\n")));
        table.register('T', |_| Box::new(LiteralRenderer::new("\t")));
        table.register('d', TimestampRenderer::boxed);
        table.register('f', |_| Box::new(FileRenderer));
        table.register('l', |_| Box::new(LineRenderer));
        table
    }

    /// Bind `letter` to `factory`, replacing any previous binding.
    pub fn register<F>(&mut self, letter: char, factory: F)
    where
        F: Fn(&str) -> Box<dyn Renderer> + Send + Sync + 'static,
    {
        self.factories.insert(letter, Arc::new(factory));
    }

    /// Whether `letter` is bound.
    pub fn contains(&self, letter: char) -> bool {
        self.factories.contains_key(&letter)
    }

    fn build(&self, letter: char, arg: &str) -> Option<Box<dyn Renderer>> {
        self.factories.get(&letter).map(|factory| factory(arg))
    }
}

static GLOBAL_DIRECTIVES: Lazy<RwLock<DirectiveTable>> =
    Lazy::new(|| RwLock::new(DirectiveTable::standard()));

/// Add a directive to the table used by [`PatternFormatter::new`].
///
/// Only affects patterns compiled afterwards.
pub fn register_directive<F>(letter: char, factory: F)
where
    F: Fn(&str) -> Box<dyn Renderer> + Send + Sync + 'static,
{
    GLOBAL_DIRECTIVES.write().register(letter, factory);
}

/// A compiled pattern.
pub struct PatternFormatter {
    pattern: String,
    renderers: Vec<Box<dyn Renderer>>,
    error: bool,
    diagnostics: Vec<String>,
}

impl PatternFormatter {
    /// Compile `pattern` against the global directive table.
    pub fn new(pattern: impl Into<String>) -> Self {
        let table = GLOBAL_DIRECTIVES.read();
        Self::with_table(pattern, &table)
    }

    /// Compile `pattern` against `table`.
    pub fn with_table(pattern: impl Into<String>, table: &DirectiveTable) -> Self {
        let pattern = pattern.into();
        let mut renderers: Vec<Box<dyn Renderer>> = Vec::new();
        let mut diagnostics = Vec::new();
        let mut error = false;

        for token in tokenize(&pattern) {
            match token {
                FormatToken::Literal(text) => renderers.push(Box::new(LiteralRenderer(text))),
                FormatToken::Directive { letter, arg } => match table.build(letter, &arg) {
                    Some(renderer) => renderers.push(renderer),
                    None => {
                        diagnostics.push(format!("unknown directive %{}", letter));
                        renderers.push(Box::new(ErrorRenderer::directive(letter)));
                    }
                },
                FormatToken::Unterminated { letter, arg } => {
                    error = true;
                    diagnostics.push(format!("unterminated '{{' after %{}: {{{}", letter, arg));
                    renderers.push(Box::new(ErrorRenderer(PATTERN_ERROR_MARKER.to_string())));
                }
            }
        }

        if !diagnostics.is_empty() {
            warn!("Log pattern '{}': {}", pattern, diagnostics.join("; "));
        }

        Self {
            pattern,
            renderers,
            error,
            diagnostics,
        }
    }

    /// Source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether compilation hit an unterminated brace.
    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Problems found while compiling, including unknown directives.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Strict check: fail if compilation reported any problem.
    pub fn validate(&self) -> Result<()> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(EmberError::PatternCompile(format!(
                "'{}': {}",
                self.pattern,
                self.diagnostics.join("; ")
            )))
        }
    }

    /// Render `record` at `level`.
    pub fn format(&self, level: LogLevel, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message.len() + 32);
        self.format_into(&mut out, level, record);
        out
    }

    /// Render `record` at `level`, appending to `out`.
    pub fn format_into(&self, out: &mut String, level: LogLevel, record: &LogRecord) {
        for renderer in &self.renderers {
            renderer.render(out, level, record);
        }
    }
}

impl std::fmt::Debug for PatternFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternFormatter")
            .field("pattern", &self.pattern)
            .field("renderers", &self.renderers.len())
            .field("error", &self.error)
            .finish()
    }
}

/// `%m`
pub struct MessageRenderer;

impl Renderer for MessageRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        out.push_str(&record.message);
    }
}

/// `%p`
pub struct LevelRenderer;

impl Renderer for LevelRenderer {
    fn render(&self, out: &mut String, level: LogLevel, _record: &LogRecord) {
        out.push_str(level.as_str());
    }
}

/// `%r`
pub struct ElapsedRenderer;

impl Renderer for ElapsedRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        let _ = write!(out, "{}", record.elapsed_ms);
    }
}

/// `%t`
pub struct ThreadIdRenderer;

impl Renderer for ThreadIdRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        let _ = write!(out, "{}", record.thread_id);
    }
}

/// `%N`
pub struct ThreadNameRenderer;

impl Renderer for ThreadNameRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        out.push_str(&record.thread_name);
    }
}

/// `%F`
pub struct FiberIdRenderer;

impl Renderer for FiberIdRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        let _ = write!(out, "{}", record.fiber_id);
    }
}

/// `%c`
pub struct LoggerNameRenderer;

impl Renderer for LoggerNameRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        out.push_str(&record.logger);
    }
}

/// `%f`
pub struct FileRenderer;

impl Renderer for FileRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        out.push_str(&record.file);
    }
}

/// `%l`
pub struct LineRenderer;

impl Renderer for LineRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        let _ = write!(out, "{}", record.line);
    }
}

/// `%d{fmt}`
pub struct TimestampRenderer {
    format: String,
}

impl TimestampRenderer {
    /// Factory for the `d` directive. Invalid strftime patterns render an
    /// error marker instead.
    pub fn boxed(arg: &str) -> Box<dyn Renderer> {
        let format = if arg.is_empty() { DEFAULT_TIMESTAMP_FORMAT } else { arg };
        if !is_valid_strftime(format) {
            warn!("Invalid timestamp format '{}'", format);
            return Box::new(ErrorRenderer::directive('d'));
        }
        Box::new(Self {
            format: format.to_string(),
        })
    }
}

impl Renderer for TimestampRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, record: &LogRecord) {
        write_timestamp(out, &record.timestamp, &self.format);
    }
}

/// Fixed text, used for literal runs, `%n` and `%T`.
pub struct LiteralRenderer(String);

impl LiteralRenderer {
    /// Renderer that always emits `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Renderer for LiteralRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, _record: &LogRecord) {
        out.push_str(&self.0);
    }
}

/// Visible marker standing in for a broken part of the pattern.
pub struct ErrorRenderer(String);

impl ErrorRenderer {
    /// Marker for an unusable directive, `<<error_format %X>>`.
    pub fn directive(letter: char) -> Self {
        Self(format!("<<error_format %{}>>", letter))
    }
}

impl Renderer for ErrorRenderer {
    fn render(&self, out: &mut String, _level: LogLevel, _record: &LogRecord) {
        out.push_str(&self.0);
    }
}
