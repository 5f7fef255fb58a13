//! Workspace lifecycle: validate, reset, create, and remove.

use crate::Error;
use crate::Result;
use crate::containment;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Scratch directory owned by one pipeline run.
///
/// Once constructed, the directory exists and is strictly inside the
/// directory the process was started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Validates `dir` against the current directory, removes it unless
    /// `preserve` is set, and creates it.
    ///
    /// Containment is checked before anything on disk is touched, so a
    /// work dir of `/`, `.` or `..` never gets removed.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkspaceOutsideRoot`] if `dir` is not strictly inside the
    ///   current directory
    /// - [`Error::Workspace`] if removal or creation fails
    pub fn prepare(dir: &Path, preserve: bool) -> Result<Self> {
        let current = std::env::current_dir()?;
        Self::prepare_in(&current, dir, preserve)
    }

    /// Same as [`Workspace::prepare`] with an explicit root instead of the
    /// current directory. A relative `dir` is resolved against `root`.
    ///
    /// # Errors
    ///
    /// See [`Workspace::prepare`].
    pub fn prepare_in(root: &Path, dir: &Path, preserve: bool) -> Result<Self> {
        let workspace = Self::resolve_in(root, dir)?;
        workspace.reset(preserve)?;
        Ok(workspace)
    }

    /// Validates `dir` against `root` without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkspaceOutsideRoot`] if `dir` is not strictly
    /// inside `root`.
    pub fn resolve_in(root: &Path, dir: &Path) -> Result<Self> {
        let candidate = root.join(dir);
        if !containment::is_strictly_inside(root, &candidate) {
            return Err(Error::WorkspaceOutsideRoot {
                path: dir.to_path_buf(),
            });
        }
        Ok(Self {
            root: containment::normalize(&candidate)?,
        })
    }

    /// Removes the directory unless `preserve` is set, then creates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workspace`] if removal or creation fails.
    pub fn reset(&self, preserve: bool) -> Result<()> {
        if !preserve {
            remove_tree(&self.root)?;
        }

        fs::create_dir_all(&self.root).map_err(|source| Error::Workspace {
            path: self.root.clone(),
            source,
        })
    }

    /// Absolute path of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Deletes the workspace tree. A workspace that is already gone is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workspace`] if removal fails.
    pub fn remove(self) -> Result<()> {
        remove_tree(&self.root)
    }
}

fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Workspace {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_directory() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let workspace = Workspace::prepare_in(temp.path(), Path::new("./work"), false).unwrap();
        assert!(workspace.path().is_dir());
        assert!(workspace.path().is_absolute());
        assert_eq!(workspace.path(), temp.path().join("work"));
    }

    #[test]
    fn test_prepare_resets_previous_contents() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = temp.path().join("work");
        fs::create_dir(&work).unwrap();
        fs::write(work.join("stale.txt"), "old").unwrap();

        Workspace::prepare_in(temp.path(), Path::new("work"), false).unwrap();
        assert!(!work.join("stale.txt").exists());
    }

    #[test]
    fn test_prepare_preserves_when_asked() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = temp.path().join("work");
        fs::create_dir(&work).unwrap();
        fs::write(work.join("kept.txt"), "old").unwrap();

        Workspace::prepare_in(temp.path(), Path::new("work"), true).unwrap();
        assert!(work.join("kept.txt").exists());
    }

    #[test]
    fn test_prepare_rejects_escapes_without_touching_disk() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(temp.path().join("sibling.txt"), "keep").unwrap();

        for dir in ["/", ".", "..", "./", "work/../..", ""] {
            let result = Workspace::prepare_in(&root, Path::new(dir), false);
            assert!(
                matches!(result, Err(Error::WorkspaceOutsideRoot { .. })),
                "work dir {dir:?} should be rejected"
            );
        }
        assert!(root.is_dir());
        assert!(temp.path().join("sibling.txt").exists());
    }

    #[test]
    fn test_prepare_rejects_absolute_outside() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let other = TempDir::new().expect("failed to create temp dir");
        let result = Workspace::prepare_in(temp.path(), other.path(), false);
        assert!(matches!(result, Err(Error::WorkspaceOutsideRoot { .. })));
        assert!(other.path().is_dir());
    }

    #[test]
    fn test_remove() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let workspace = Workspace::prepare_in(temp.path(), Path::new("work"), false).unwrap();
        let path = workspace.path().to_path_buf();
        fs::write(path.join("file"), "x").unwrap();

        workspace.clone().remove().unwrap();
        assert!(!path.exists());
        workspace.remove().unwrap();
    }

    #[test]
    fn test_resolve_does_not_touch_disk() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let workspace = Workspace::resolve_in(temp.path(), Path::new("work")).unwrap();
        assert_eq!(workspace.path(), temp.path().join("work"));
        assert!(!workspace.path().exists());

        workspace.reset(false).unwrap();
        assert!(workspace.path().is_dir());
    }
}
