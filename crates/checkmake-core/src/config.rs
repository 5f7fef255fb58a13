//! Run configuration.
//!
//! A [`Config`] is built once, with every option resolved to an explicit
//! value, and is only read afterwards.

use crate::BuildCommand;
use crate::CaptureFiles;
use crate::Level;
use std::path::Path;
use std::path::PathBuf;

/// Default workspace directory.
pub const DEFAULT_WORK_DIR: &str = "./work";

/// Default name of the captured standard output file inside the workspace.
pub const STDOUT_FILE: &str = "make.stdout";

/// Default name of the captured standard error file inside the workspace.
pub const STDERR_FILE: &str = "make.stderr";

/// Default name of the persistent log inside the workspace.
pub const LOG_FILE: &str = "checkmake.out";

/// Default console threshold.
pub const DEFAULT_CONSOLE_LEVEL: Level = Level::Warning;

/// Default persistent log threshold.
pub const DEFAULT_FILE_LEVEL: Level = Level::Info;

/// Immutable configuration of one pipeline run.
///
/// # Examples
///
/// ```
/// use checkmake_core::Config;
/// use checkmake_core::Level;
/// use std::path::Path;
///
/// let config = Config::builder("submission.tar.gz").build();
/// assert_eq!(config.work_dir(), Path::new("./work"));
/// assert_eq!(config.stdout_file(), Path::new("./work/make.stdout"));
/// assert_eq!(config.console_level(), Level::Warning);
/// assert!(config.target().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    archive: PathBuf,
    work_dir: PathBuf,
    preserve_workspace: bool,
    cleanup_workspace: bool,
    stdout_file: PathBuf,
    stderr_file: PathBuf,
    log_file: PathBuf,
    console_level: Level,
    file_level: Level,
    target: Option<String>,
    build_command: BuildCommand,
}

impl Config {
    /// Starts a builder for checking `archive`.
    pub fn builder(archive: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new(archive)
    }

    /// Archive under test.
    #[must_use]
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Workspace directory.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Keep an existing workspace instead of removing it before the run.
    #[must_use]
    pub const fn preserve_workspace(&self) -> bool {
        self.preserve_workspace
    }

    /// Remove the workspace after the run.
    #[must_use]
    pub const fn cleanup_workspace(&self) -> bool {
        self.cleanup_workspace
    }

    /// Captured standard output destination.
    #[must_use]
    pub fn stdout_file(&self) -> &Path {
        &self.stdout_file
    }

    /// Captured standard error destination.
    #[must_use]
    pub fn stderr_file(&self) -> &Path {
        &self.stderr_file
    }

    /// Persistent log destination.
    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Console threshold.
    #[must_use]
    pub const fn console_level(&self) -> Level {
        self.console_level
    }

    /// Persistent log threshold.
    #[must_use]
    pub const fn file_level(&self) -> Level {
        self.file_level
    }

    /// Name of the artifact the build must produce, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Build command run inside the project directory.
    #[must_use]
    pub const fn build_command(&self) -> &BuildCommand {
        &self.build_command
    }

    /// Both capture destinations.
    #[must_use]
    pub fn capture_files(&self) -> CaptureFiles {
        CaptureFiles {
            stdout: self.stdout_file.clone(),
            stderr: self.stderr_file.clone(),
        }
    }
}

/// Builder for [`Config`]. Unset paths default relative to the work dir.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    archive: PathBuf,
    work_dir: PathBuf,
    preserve_workspace: bool,
    cleanup_workspace: bool,
    stdout_file: Option<PathBuf>,
    stderr_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    console_level: Level,
    file_level: Level,
    target: Option<String>,
    build_command: BuildCommand,
}

impl ConfigBuilder {
    /// Creates a builder with every option at its default.
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            preserve_workspace: false,
            cleanup_workspace: false,
            stdout_file: None,
            stderr_file: None,
            log_file: None,
            console_level: DEFAULT_CONSOLE_LEVEL,
            file_level: DEFAULT_FILE_LEVEL,
            target: None,
            build_command: BuildCommand::default(),
        }
    }

    /// Sets the workspace directory.
    #[must_use]
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Sets whether an existing workspace is kept.
    #[must_use]
    pub fn preserve_workspace(mut self, preserve: bool) -> Self {
        self.preserve_workspace = preserve;
        self
    }

    /// Sets whether the workspace is removed after the run.
    #[must_use]
    pub fn cleanup_workspace(mut self, cleanup: bool) -> Self {
        self.cleanup_workspace = cleanup;
        self
    }

    /// Overrides the captured standard output destination.
    #[must_use]
    pub fn stdout_file(mut self, path: Option<PathBuf>) -> Self {
        self.stdout_file = path;
        self
    }

    /// Overrides the captured standard error destination.
    #[must_use]
    pub fn stderr_file(mut self, path: Option<PathBuf>) -> Self {
        self.stderr_file = path;
        self
    }

    /// Overrides the persistent log destination.
    #[must_use]
    pub fn log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// Sets the console threshold.
    #[must_use]
    pub fn console_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }

    /// Sets the persistent log threshold.
    #[must_use]
    pub fn file_level(mut self, level: Level) -> Self {
        self.file_level = level;
        self
    }

    /// Requires the build to produce a file with this name. An empty name
    /// counts as no target.
    #[must_use]
    pub fn target(mut self, target: Option<String>) -> Self {
        self.target = target.filter(|name| !name.is_empty());
        self
    }

    /// Sets the build command.
    #[must_use]
    pub fn build_command(mut self, command: BuildCommand) -> Self {
        self.build_command = command;
        self
    }

    /// Resolves defaults and produces the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        let stdout_file = self
            .stdout_file
            .unwrap_or_else(|| self.work_dir.join(STDOUT_FILE));
        let stderr_file = self
            .stderr_file
            .unwrap_or_else(|| self.work_dir.join(STDERR_FILE));
        let log_file = self
            .log_file
            .unwrap_or_else(|| self.work_dir.join(LOG_FILE));

        Config {
            archive: self.archive,
            work_dir: self.work_dir,
            preserve_workspace: self.preserve_workspace,
            cleanup_workspace: self.cleanup_workspace,
            stdout_file,
            stderr_file,
            log_file,
            console_level: self.console_level,
            file_level: self.file_level,
            target: self.target,
            build_command: self.build_command,
        }
    }
}
