//! Test utilities for building project archives and capturing log output.
//!
//! This module provides reusable helpers for creating in-memory tar and
//! tar.gz archives and the sample corpus the self-test harness runs
//! against.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

/// Makefile used by buildable sample projects. Produces a `hello` file.
pub const SAMPLE_MAKEFILE: &str = "all: hello\n\nhello:\n\tprintf 'hello\\n' > hello\n";

/// Makefile whose build always fails.
pub const BROKEN_MAKEFILE: &str = "all:\n\t@echo 'compiling...'\n\t@echo 'error: missing semicolon' >&2\n\texit 2\n";

/// Documentation content used by sample projects.
pub const SAMPLE_README: &str = "Sample project.\n";

/// Builder for tar archives shaped like student submissions.
///
/// Supports files, directories, symlinks, hard links, and raw entries whose
/// recorded path bypasses the tar crate's own path validation.
///
/// # Examples
///
/// ```
/// use checkmake_core::test_utils::ProjectArchiveBuilder;
///
/// let tar_gz = ProjectArchiveBuilder::new()
///     .add_directory("proj/")
///     .add_file("proj/README.txt", b"docs")
///     .build_tar_gz();
/// assert!(!tar_gz.is_empty());
/// ```
pub struct ProjectArchiveBuilder {
    builder: tar::Builder<Vec<u8>>,
}

impl ProjectArchiveBuilder {
    /// Creates an empty archive builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    /// Adds a regular file with mode 0o644.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        self.builder.append_data(&mut header, path, data).unwrap();
        self
    }

    /// Adds a directory with mode 0o755.
    #[must_use]
    pub fn add_directory(mut self, path: &str) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_cksum();
        self.builder
            .append_data(&mut header, path, io::empty())
            .unwrap();
        self
    }

    /// Adds a symbolic link. The target is recorded verbatim.
    #[must_use]
    pub fn add_symlink(self, path: &str, target: &str) -> Self {
        self.add_link(path, target, tar::EntryType::Symlink)
    }

    /// Adds a hard link. The target is recorded verbatim.
    #[must_use]
    pub fn add_hardlink(self, path: &str, target: &str) -> Self {
        self.add_link(path, target, tar::EntryType::Link)
    }

    fn add_link(mut self, path: &str, target: &str, entry_type: tar::EntryType) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o777);
        header.set_entry_type(entry_type);
        write_name(&mut header.as_gnu_mut().unwrap().linkname, target);
        write_name(&mut header.as_gnu_mut().unwrap().name, path);
        header.set_cksum();
        self.builder.append(&header, io::empty()).unwrap();
        self
    }

    /// Adds a regular file whose recorded path is written byte for byte,
    /// so it may contain `..` or start with `/`.
    #[must_use]
    pub fn add_raw_file(mut self, path: &str, data: &[u8]) -> Self {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        write_name(&mut header.as_gnu_mut().unwrap().name, path);
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    /// Finishes the archive as an uncompressed tar stream.
    #[must_use]
    pub fn build_tar(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }

    /// Finishes the archive as a gzip-compressed tar stream.
    #[must_use]
    pub fn build_tar_gz(self) -> Vec<u8> {
        gzip(&self.build_tar())
    }
}

impl Default for ProjectArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_name(slot: &mut [u8; 100], name: &str) {
    let bytes = name.as_bytes();
    assert!(bytes.len() < slot.len(), "name too long for a tar header");
    slot.fill(0);
    slot[..bytes.len()].copy_from_slice(bytes);
}

/// Gzip-compresses `data`.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A well-formed, buildable, documented project rooted at `proj/`.
#[must_use]
pub fn sample_project() -> ProjectArchiveBuilder {
    ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_file("proj/Makefile", SAMPLE_MAKEFILE.as_bytes())
        .add_file("proj/README.txt", SAMPLE_README.as_bytes())
}

/// Writes the six-archive sample corpus into `dir`.
///
/// | Archive | Shape |
/// |---------|-------|
/// | `project.tar` | valid project, but not gzip-compressed |
/// | `project.tar.gz` | valid project |
/// | `project_build_error.tar.gz` | build exits non-zero |
/// | `project_empty_readme.tar.gz` | `README.txt` is empty |
/// | `project_no_dir.tar.gz` | valid project without a top-level directory |
/// | `project_no_readme.tar.gz` | `README.txt` is absent |
pub fn write_sample_corpus(dir: &Path) -> io::Result<()> {
    std::fs::write(dir.join("project.tar"), sample_project().build_tar())?;
    std::fs::write(dir.join("project.tar.gz"), sample_project().build_tar_gz())?;
    std::fs::write(
        dir.join("project_build_error.tar.gz"),
        ProjectArchiveBuilder::new()
            .add_directory("proj/")
            .add_file("proj/Makefile", BROKEN_MAKEFILE.as_bytes())
            .add_file("proj/README.txt", SAMPLE_README.as_bytes())
            .build_tar_gz(),
    )?;
    std::fs::write(
        dir.join("project_empty_readme.tar.gz"),
        ProjectArchiveBuilder::new()
            .add_directory("proj/")
            .add_file("proj/Makefile", SAMPLE_MAKEFILE.as_bytes())
            .add_file("proj/README.txt", b"")
            .build_tar_gz(),
    )?;
    std::fs::write(
        dir.join("project_no_dir.tar.gz"),
        ProjectArchiveBuilder::new()
            .add_file("Makefile", SAMPLE_MAKEFILE.as_bytes())
            .add_file("README.txt", SAMPLE_README.as_bytes())
            .build_tar_gz(),
    )?;
    std::fs::write(
        dir.join("project_no_readme.tar.gz"),
        ProjectArchiveBuilder::new()
            .add_directory("proj/")
            .add_file("proj/Makefile", SAMPLE_MAKEFILE.as_bytes())
            .build_tar_gz(),
    )?;
    Ok(())
}

/// Cloneable in-memory writer, for handing to a [`crate::Logger`] while
/// keeping a handle to read what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
