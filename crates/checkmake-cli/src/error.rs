//! Error conversion utilities for CLI.
//!
//! Converts checkmake-core's fatal errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use checkmake_core::Error;
use std::path::Path;

/// Converts a fatal core error into an anyhow error with a hint line.
pub fn convert_fatal_error(err: Error, work_dir: &Path) -> anyhow::Error {
    match err {
        Error::WorkspaceOutsideRoot { path } => {
            anyhow!(
                "The working directory '{}' must be a child of the current directory\n\
                 HINT: This keeps a bad --work value from removing unrelated files. \
                 Use a relative path such as ./work.",
                path.display()
            )
        }
        Error::Workspace { path, source } => {
            anyhow!(
                "Cannot prepare workspace '{}': {}\n\
                 HINT: Check permissions on the workspace and its parent directory.",
                path.display(),
                source
            )
        }
        Error::LogFile { path, source } => {
            anyhow!(
                "Cannot open log file '{}': {}\n\
                 HINT: Use --log to write the log somewhere writable.",
                path.display(),
                source
            )
        }
        Error::InvalidLevel(name) => {
            anyhow!(
                "Invalid log level: {name}\n\
                 HINT: Valid levels are NONE, FATAL, ERROR, WARNING, INFO, DEBUG and ALL."
            )
        }
        Error::Io(io_err) => anyhow::Error::from(io_err).context(format!(
            "I/O error while preparing workspace '{}'",
            work_dir.display()
        )),
    }
}
