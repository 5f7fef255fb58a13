//! Error types for the acceptance pipeline.
//!
//! Two channels exist. [`Error`] is fatal: the run cannot start or cannot
//! be finished cleanly. [`StageError`] is an expected, recoverable outcome
//! of one stage; the orchestrator turns it into a failed verdict.

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the fatal [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for a single pipeline stage.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Fatal errors that stop the process before or after the stages run.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A severity name did not match any known level.
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// The workspace is not strictly inside the current directory.
    #[error("working directory must be a child of the current directory: {path}")]
    WorkspaceOutsideRoot {
        /// The rejected workspace path.
        path: PathBuf,
    },

    /// Creating or removing the workspace failed.
    #[error("failed to prepare workspace {path}: {source}")]
    Workspace {
        /// The workspace path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The persistent log could not be opened.
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// The log file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Reasons a pipeline stage can fail.
#[derive(Error, Debug)]
pub enum StageError {
    /// The archive file could not be opened.
    #[error("cannot open archive {path}: {source}")]
    ArchiveOpen {
        /// The archive path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The archive is not a readable gzip-compressed tar stream.
    #[error("error expanding the archive: {0}")]
    ArchiveRead(#[source] std::io::Error),

    /// The archive holds no members at all.
    #[error("archive {path} has no members")]
    EmptyArchive {
        /// The archive path.
        path: PathBuf,
    },

    /// A member path is absolute or contains a `..` component.
    #[error("archive member escapes the workspace: {path}")]
    UnsafeMember {
        /// The member path as recorded in the archive.
        path: PathBuf,
    },

    /// A symbolic or hard link points outside the workspace.
    #[error("archive link {path} points outside the workspace: {target}")]
    LinkEscape {
        /// The link member path.
        path: PathBuf,
        /// The recorded link target.
        target: PathBuf,
    },

    /// The build command could not be started.
    #[error("cannot launch build command `{program}`: {source}")]
    BuildLaunch {
        /// The program that was invoked.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The build command exited unsuccessfully.
    #[error("build failed with {}", describe_exit(.code))]
    BuildFailed {
        /// Exit code, or `None` when the process was killed by a signal.
        code: Option<i32>,
    },

    /// A captured output stream could not be written to disk.
    #[error("cannot write captured output to {path}: {source}")]
    CaptureWrite {
        /// The capture file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The documentation file does not exist.
    #[error("README.txt not found at {path}: {source}")]
    ReadmeMissing {
        /// Expected location of the documentation file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The documentation file exists but has no content.
    #[error("README.txt exists but it is empty: {path}")]
    ReadmeEmpty {
        /// Location of the documentation file.
        path: PathBuf,
    },

    /// The documentation path exists but is not a regular file.
    #[error("README.txt is not a regular file: {path}")]
    ReadmeNotFile {
        /// Location of the documentation path.
        path: PathBuf,
    },

    /// The requested artifact name is not a plain file name, so it could
    /// name a file outside the project directory.
    #[error("target must be a plain file name inside the project directory: {name}")]
    ArtifactName {
        /// Artifact name as requested.
        name: String,
    },

    /// The requested build artifact does not exist.
    #[error("target file {name} not found at {path}: {source}")]
    ArtifactMissing {
        /// Artifact name as requested.
        name: String,
        /// Expected location of the artifact.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl StageError {
    /// Returns the stage this failure belongs to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::ArchiveOpen { .. }
            | Self::ArchiveRead(_)
            | Self::EmptyArchive { .. }
            | Self::UnsafeMember { .. }
            | Self::LinkEscape { .. } => Stage::Extract,
            Self::BuildLaunch { .. } | Self::BuildFailed { .. } | Self::CaptureWrite { .. } => {
                Stage::Build
            }
            Self::ReadmeMissing { .. } | Self::ReadmeEmpty { .. } | Self::ReadmeNotFile { .. } => {
                Stage::Readme
            }
            Self::ArtifactName { .. } | Self::ArtifactMissing { .. } => Stage::Target,
        }
    }

    /// Returns `true` if the archive tried to place files outside the
    /// workspace.
    #[must_use]
    pub const fn is_containment_violation(&self) -> bool {
        matches!(self, Self::UnsafeMember { .. } | Self::LinkEscape { .. })
    }
}

#[allow(clippy::ref_option)]
fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || "termination by signal".to_string(),
        |code| format!("return code {code}"),
    )
}
