//! Leveled logger writing to a persistent file and to the console.
//!
//! Every record is rendered as `LEVEL: message` and offered to two sinks.
//! Each sink has its own threshold and accepts a record only when the
//! record's level is at or below that threshold, where a lower level is
//! more severe (`FATAL` = 1 ... `DEBUG` = 5). `NONE` as a threshold accepts
//! nothing real and `ALL` accepts everything.

use crate::Error;
use crate::Result;
use console::Term;
use console::style;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::PoisonError;

/// Severity of a log record, and threshold of a sink.
///
/// The numeric value is the comparison key: a record is emitted to a sink
/// iff `record_level <= sink_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Sentinel threshold that suppresses every record.
    None = 0,
    /// Unrecoverable condition.
    Fatal = 1,
    /// A stage or operation failed.
    Error = 2,
    /// Something unexpected that does not fail the run.
    Warning = 3,
    /// Progress of the run.
    Info = 4,
    /// Diagnostic detail.
    Debug = 5,
    /// Sentinel threshold that accepts every record.
    All = 6,
}

impl Level {
    /// All levels in ascending numeric order.
    pub const ALL_LEVELS: [Self; 7] = [
        Self::None,
        Self::Fatal,
        Self::Error,
        Self::Warning,
        Self::Info,
        Self::Debug,
        Self::All,
    ];

    /// Returns the canonical upper-case name of the level.
    ///
    /// # Examples
    ///
    /// ```
    /// use checkmake_core::Level;
    ///
    /// assert_eq!(Level::Warning.as_str(), "WARNING");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::All => "ALL",
        }
    }

    /// Returns the numeric comparison key.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Returns `true` if a record of this level passes `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use checkmake_core::Level;
    ///
    /// assert!(Level::Error.passes(Level::Warning));
    /// assert!(!Level::Debug.passes(Level::Info));
    /// ```
    #[must_use]
    pub const fn passes(self, threshold: Self) -> bool {
        self.value() <= threshold.value()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    /// Resolves a level name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL_LEVELS
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidLevel(s.to_string()))
    }
}

/// One output destination with its own threshold.
struct Sink {
    threshold: Level,
    styled: bool,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    fn new(writer: Box<dyn Write + Send>, threshold: Level, styled: bool) -> Self {
        Self {
            threshold,
            styled,
            writer: Mutex::new(writer),
        }
    }

    fn emit(&self, level: Level, message: &str) {
        if !level.passes(self.threshold) {
            return;
        }

        let tag = format!("{level}:");
        let tag = if self.styled {
            styled_tag(level, tag)
        } else {
            tag
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{tag} {message}");
        let _ = writer.flush();
    }

    fn flush(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

fn styled_tag(level: Level, tag: String) -> String {
    match level {
        Level::Fatal | Level::Error => style(tag).red().bold().to_string(),
        Level::Warning => style(tag).yellow().bold().to_string(),
        Level::Info => style(tag).cyan().to_string(),
        Level::Debug => style(tag).dim().to_string(),
        Level::None | Level::All => tag,
    }
}

/// Process logger with a persistent sink and a console sink.
///
/// The logger is owned by whoever runs the pipeline and is passed by
/// reference to every component that logs. Dropping it flushes both sinks.
///
/// # Examples
///
/// ```no_run
/// use checkmake_core::Level;
/// use checkmake_core::Logger;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let log = Logger::create("work/checkmake.out", Level::Warning, Level::Info)?;
/// log.info("Starting");
/// log.error("something went wrong");
/// # Ok(())
/// # }
/// ```
pub struct Logger {
    file: Sink,
    console: Sink,
}

impl Logger {
    /// Opens `path` (truncating it) as the persistent sink and uses
    /// standard output as the console sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogFile`] if the file cannot be created.
    pub fn create(
        path: impl AsRef<Path>,
        console_level: Level,
        file_level: Level,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::LogFile {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file: Sink::new(Box::new(BufWriter::new(file)), file_level, false),
            console: Sink::new(
                Box::new(Term::stdout()),
                console_level,
                console::colors_enabled(),
            ),
        })
    }

    /// Console-only logger, used once the persistent sink is closed.
    #[must_use]
    pub fn console(console_level: Level) -> Self {
        Self {
            file: Sink::new(Box::new(std::io::sink()), Level::None, false),
            console: Sink::new(
                Box::new(Term::stdout()),
                console_level,
                console::colors_enabled(),
            ),
        }
    }

    /// Builds a logger over arbitrary writers. Output is never styled.
    pub fn with_writers<C, F>(console: C, console_level: Level, file: F, file_level: Level) -> Self
    where
        C: Write + Send + 'static,
        F: Write + Send + 'static,
    {
        Self {
            file: Sink::new(Box::new(file), file_level, false),
            console: Sink::new(Box::new(console), console_level, false),
        }
    }

    /// A logger that discards everything.
    #[must_use]
    pub fn discard() -> Self {
        Self::with_writers(std::io::sink(), Level::None, std::io::sink(), Level::None)
    }

    /// Threshold of the console sink.
    #[must_use]
    pub const fn console_level(&self) -> Level {
        self.console.threshold
    }

    /// Threshold of the persistent sink.
    #[must_use]
    pub const fn file_level(&self) -> Level {
        self.file.threshold
    }

    /// Offers `message` to both sinks at `level`.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        let message = message.to_string();
        self.file.emit(level, &message);
        self.console.emit(level, &message);
    }

    /// Logs at [`Level::Fatal`].
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Level::Fatal, message);
    }

    /// Logs at [`Level::Error`].
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Logs at [`Level::Warning`].
    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Level::Warning, message);
    }

    /// Logs at [`Level::Info`].
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    /// Logs at [`Level::Debug`].
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.file.flush();
        self.console.flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("console_level", &self.console.threshold)
            .field("file_level", &self.file.threshold)
            .finish_non_exhaustive()
    }
}
