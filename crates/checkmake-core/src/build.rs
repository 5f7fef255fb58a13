//! Build runner.
//!
//! Runs the build command inside the project directory, captures both
//! output streams and the exit code, logs the transcript and persists the
//! captured streams. The transcript is logged at `INFO` when the build
//! succeeds and at `ERROR` when it does not; its text is the same either
//! way.

use crate::Level;
use crate::Logger;
use crate::StageError;
use crate::StageResult;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;

/// Program invoked when no other build command is configured.
pub const DEFAULT_BUILD_PROGRAM: &str = "make";

/// External build command: a program plus fixed arguments.
///
/// The default is `make` with no arguments.
///
/// # Examples
///
/// ```
/// use checkmake_core::BuildCommand;
///
/// let make = BuildCommand::default();
/// assert_eq!(make.to_string(), "make");
///
/// let script = BuildCommand::new("sh").arg("-c").arg("exit 0");
/// assert_eq!(script.args().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl BuildCommand {
    /// Creates a command that runs `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Program name or path.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Fixed arguments.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl Default for BuildCommand {
    fn default() -> Self {
        Self::new(DEFAULT_BUILD_PROGRAM)
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Where the captured output streams are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFiles {
    /// Destination of the captured standard output.
    pub stdout: PathBuf,
    /// Destination of the captured standard error.
    pub stderr: PathBuf,
}

/// Result of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl BuildOutcome {
    /// Returns `true` iff the exit code is exactly zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Level at which the transcript is logged.
    #[must_use]
    pub fn transcript_level(&self) -> Level {
        if self.success() {
            Level::Info
        } else {
            Level::Error
        }
    }

    fn exit_description(&self) -> String {
        self.exit_code.map_or_else(
            || "terminated by signal".to_string(),
            |code| format!("exited with return code {code}"),
        )
    }
}

/// Runs `command` with `project_dir` as its working directory.
///
/// The caller's own working directory is never changed. Both streams are
/// written verbatim to `captures` whether or not the build succeeded.
///
/// # Errors
///
/// - [`StageError::BuildLaunch`] if the program cannot be started
/// - [`StageError::CaptureWrite`] if either capture file cannot be written,
///   even when the build itself succeeded
/// - [`StageError::BuildFailed`] if the exit code is not zero
pub fn run_build(
    command: &BuildCommand,
    project_dir: &Path,
    captures: &CaptureFiles,
    log: &Logger,
) -> StageResult<BuildOutcome> {
    log.info(format!(
        "Running `{command}` in {}",
        project_dir.display()
    ));

    let output = Command::new(command.program())
        .args(command.args())
        .current_dir(project_dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| StageError::BuildLaunch {
            program: command.to_string(),
            source,
        })?;

    let outcome = BuildOutcome {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    log_transcript(command, &outcome, log);
    persist(&outcome, captures)?;

    if outcome.success() {
        Ok(outcome)
    } else {
        Err(StageError::BuildFailed {
            code: outcome.exit_code,
        })
    }
}

fn log_transcript(command: &BuildCommand, outcome: &BuildOutcome, log: &Logger) {
    let level = outcome.transcript_level();
    log.log(
        level,
        format!("{command} {}", outcome.exit_description()),
    );
    log.log(level, "stdout ---------------------");
    log.log(level, &outcome.stdout);
    log.log(level, "stderr ---------------------");
    log.log(level, &outcome.stderr);
}

fn persist(outcome: &BuildOutcome, captures: &CaptureFiles) -> StageResult<()> {
    for (path, text) in [
        (&captures.stdout, &outcome.stdout),
        (&captures.stderr, &outcome.stderr),
    ] {
        fs::write(path, text).map_err(|source| StageError::CaptureWrite {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}
