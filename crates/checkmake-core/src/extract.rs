//! Archive extraction into the workspace.
//!
//! The archive must be a gzip-compressed tar stream. Its first member
//! decides the project layout: a directory member means the project lives
//! under `workspace/<name>`, anything else means the workspace itself is
//! the project directory.
//!
//! Every member is checked before it is written. A member whose path is
//! absolute or climbs with `..`, or a link whose target leaves the
//! workspace, rejects the whole archive. Link targets are also walked
//! against what is already on disk, and once every member is written each
//! symlink is resolved for real, so a chain of links cannot escape either.

use crate::Logger;
use crate::StageError;
use crate::StageResult;
use crate::containment::resolve_within;
use flate2::read::GzDecoder;
use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Outcome of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Directory the build runs in: `workspace/<top>` for a directory-rooted
    /// archive, `workspace` otherwise.
    pub project_dir: PathBuf,

    /// Name of the top-level directory, if the first member was one.
    pub top_level: Option<PathBuf>,

    /// Number of members unpacked.
    pub members: usize,
}

impl Extraction {
    /// Returns `true` if the archive was rooted under a directory.
    #[must_use]
    pub fn is_directory_rooted(&self) -> bool {
        self.top_level.is_some()
    }
}

/// Extracts `archive` into `workspace` and resolves the project directory.
///
/// `workspace` must already exist.
///
/// # Errors
///
/// - [`StageError::ArchiveOpen`] if the file cannot be opened
/// - [`StageError::ArchiveRead`] if it is not a valid tar.gz stream or a
///   member cannot be written
/// - [`StageError::EmptyArchive`] if it has no members
/// - [`StageError::UnsafeMember`] / [`StageError::LinkEscape`] if a member
///   would land outside the workspace
pub fn extract_project(archive: &Path, workspace: &Path, log: &Logger) -> StageResult<Extraction> {
    log.info(format!(
        "Expanding archive {} into {}",
        archive.display(),
        workspace.display()
    ));

    let file = File::open(archive).map_err(|source| StageError::ArchiveOpen {
        path: archive.to_path_buf(),
        source,
    })?;
    let decoder = GzDecoder::new(BufReader::new(file));

    let Some(extraction) = unpack(decoder, workspace, log)? else {
        return Err(StageError::EmptyArchive {
            path: archive.to_path_buf(),
        });
    };

    log.info(format!(
        "Project dir is set to: {}",
        extraction.project_dir.display()
    ));
    Ok(extraction)
}

/// Unpacks a tar stream. Returns `None` when the stream has no members.
fn unpack<R: Read>(reader: R, workspace: &Path, log: &Logger) -> StageResult<Option<Extraction>> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(StageError::ArchiveRead)?;

    let mut layout: Option<(PathBuf, Option<PathBuf>)> = None;
    let mut symlinks = Vec::new();
    let mut members = 0;

    for entry in entries {
        let mut entry = entry.map_err(StageError::ArchiveRead)?;
        let recorded = entry.path().map_err(StageError::ArchiveRead)?.into_owned();
        let member = member_path(&recorded)?;

        if layout.is_none() {
            layout = Some(inspect_first_member(
                &member,
                entry.header().entry_type(),
                workspace,
                log,
            ));
        }

        let symlink = check_link(&entry, workspace, &recorded, &member)?;

        log.debug(format!("Extracting {}", recorded.display()));
        let unpacked = entry.unpack_in(workspace).map_err(StageError::ArchiveRead)?;
        if !unpacked {
            return Err(StageError::UnsafeMember { path: recorded });
        }
        if let Some(target) = symlink {
            symlinks.push((member, recorded, target));
        }
        members += 1;
    }

    verify_symlinks(workspace, &symlinks)?;

    Ok(layout.map(|(project_dir, top_level)| Extraction {
        project_dir,
        top_level,
        members,
    }))
}

fn inspect_first_member(
    member: &Path,
    entry_type: tar::EntryType,
    workspace: &Path,
    log: &Logger,
) -> (PathBuf, Option<PathBuf>) {
    if !entry_type.is_dir() {
        log.warning(
            "Top member of the archive is not a directory. Using the workspace as the project dir.",
        );
        return (workspace.to_path_buf(), None);
    }

    if member.as_os_str().is_empty() {
        log.info("Top level of the archive is the archive root itself");
        return (workspace.to_path_buf(), None);
    }

    log.info(format!(
        "Top level of the archive is the directory: {}",
        member.display()
    ));
    (workspace.join(member), Some(member.to_path_buf()))
}

/// Normalizes a recorded member path relative to the workspace root.
fn member_path(recorded: &Path) -> StageResult<PathBuf> {
    resolve_within(Path::new(""), recorded)
        .filter(|_| !climbs(recorded))
        .ok_or_else(|| StageError::UnsafeMember {
            path: recorded.to_path_buf(),
        })
}

/// Any `..` in a member path is rejected, even one that would fold away.
fn climbs(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::ParentDir))
}

/// Validates a link member before it is written. Returns the recorded
/// target of a symlink so it can be resolved again once extraction is
/// complete.
fn check_link<R: Read>(
    entry: &tar::Entry<'_, R>,
    workspace: &Path,
    recorded: &Path,
    member: &Path,
) -> StageResult<Option<PathBuf>> {
    let entry_type = entry.header().entry_type();
    if !entry_type.is_symlink() && !entry_type.is_hard_link() {
        return Ok(None);
    }

    let Some(target) = entry.link_name().map_err(StageError::ArchiveRead)? else {
        return Ok(None);
    };
    let target = target.into_owned();

    // Symlink targets are relative to the link's directory, hard link
    // targets to the archive root.
    let base = if entry_type.is_symlink() {
        member.parent().unwrap_or_else(|| Path::new(""))
    } else {
        Path::new("")
    };

    if resolve_within(base, &target).is_none() || traverses_symlink(workspace, base, &target) {
        return Err(StageError::LinkEscape {
            path: recorded.to_path_buf(),
            target,
        });
    }

    Ok(entry_type.is_symlink().then_some(target))
}

/// Returns `true` if resolving `target` from `base` would pass through a
/// symlink already on disk. The final component may itself be a symlink.
fn traverses_symlink(workspace: &Path, base: &Path, target: &Path) -> bool {
    let mut walked = PathBuf::new();

    for component in base.components().chain(target.components()) {
        if !walked.as_os_str().is_empty() && is_symlink(&workspace.join(&walked)) {
            return true;
        }
        match component {
            Component::Normal(part) => walked.push(part),
            Component::ParentDir => {
                walked.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    false
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|metadata| metadata.file_type().is_symlink())
}

/// Resolves every extracted symlink on disk and rejects the archive if one
/// ends up outside the workspace. Links written later in the archive can
/// change where an earlier one points, so this runs after the last member.
fn verify_symlinks(workspace: &Path, symlinks: &[(PathBuf, PathBuf, PathBuf)]) -> StageResult<()> {
    if symlinks.is_empty() {
        return Ok(());
    }

    let root = fs::canonicalize(workspace).map_err(StageError::ArchiveRead)?;

    for (member, recorded, target) in symlinks {
        let inside = resolve_on_disk(&workspace.join(member))
            .is_ok_and(|resolved| resolved.starts_with(&root));
        if !inside {
            return Err(StageError::LinkEscape {
                path: recorded.clone(),
                target: target.clone(),
            });
        }
    }
    Ok(())
}

/// Canonicalizes `link`. A dangling link resolves through its deepest
/// existing ancestor, with the missing tail folded lexically.
fn resolve_on_disk(link: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(link) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        result => return result,
    }

    let parent = link.parent().unwrap_or_else(|| Path::new(""));
    let full = parent.join(fs::read_link(link)?);

    for ancestor in full.ancestors().skip(1) {
        let Ok(mut resolved) = fs::canonicalize(ancestor) else {
            continue;
        };
        let tail = full
            .strip_prefix(ancestor)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        for component in tail.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Ok(resolved);
    }

    Err(io::Error::from(io::ErrorKind::NotFound))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::Level;
    use crate::test_utils::ProjectArchiveBuilder;
    use crate::test_utils::SharedBuffer;
    use std::fs;
    use tempfile::TempDir;

    fn write_archive(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    fn workspace(temp: &TempDir) -> PathBuf {
        let work = temp.path().join("work");
        fs::create_dir(&work).unwrap();
        work
    }

    #[test]
    fn test_directory_rooted_archive() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = workspace(&temp);
        let data = ProjectArchiveBuilder::new()
            .add_directory("proj/")
            .add_file("proj/README.txt", b"docs")
            .add_file("proj/Makefile", b"all:\n")
            .build_tar_gz();
        let archive = write_archive(temp.path(), "project.tar.gz", &data);

        let extraction = extract_project(&archive, &work, &Logger::discard()).unwrap();

        assert_eq!(extraction.project_dir, work.join("proj"));
        assert_eq!(extraction.top_level, Some(PathBuf::from("proj")));
        assert!(extraction.is_directory_rooted());
        assert_eq!(extraction.members, 3);
        assert_eq!(
            fs::read_to_string(work.join("proj/README.txt")).unwrap(),
            "docs"
        );
    }

    #[test]
    fn test_loose_files_use_workspace() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = workspace(&temp);
        let data = ProjectArchiveBuilder::new()
            .add_file("README.txt", b"docs")
            .add_file("Makefile", b"all:\n")
            .build_tar_gz();
        let archive = write_archive(temp.path(), "project_no_dir.tar.gz", &data);

        let console = SharedBuffer::new();
        let log = Logger::with_writers(console.clone(), Level::Warning, std::io::sink(), Level::None);
        let extraction = extract_project(&archive, &work, &log).unwrap();

        assert_eq!(extraction.project_dir, work);
        assert!(!extraction.is_directory_rooted());
        assert!(work.join("Makefile").exists());
        assert!(console.contents().starts_with("WARNING: Top member"));
    }

    #[test]
    fn test_dot_directory_first_member() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = workspace(&temp);
        let data = ProjectArchiveBuilder::new()
            .add_directory("./")
            .add_file("./README.txt", b"docs")
            .build_tar_gz();
        let archive = write_archive(temp.path(), "dot.tar.gz", &data);

        let extraction = extract_project(&archive, &work, &Logger::discard()).unwrap();
        assert_eq!(extraction.project_dir, work);
        assert!(work.join("README.txt").exists());
    }

    #[test]
    fn test_uncompressed_tar_is_rejected() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = workspace(&temp);
        let data = ProjectArchiveBuilder::new()
            .add_directory("proj/")
            .add_file("proj/README.txt", b"docs")
            .build_tar();
        let archive = write_archive(temp.path(), "project.tar", &data);

        let result = extract_project(&archive, &work, &Logger::discard());
        assert!(matches!(result, Err(StageError::ArchiveRead(_))));
    }

    #[test]
    fn test_missing_archive() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = workspace(&temp);
        let result = extract_project(&temp.path().join("nope.tar.gz"), &work, &Logger::discard());
        assert!(matches!(result, Err(StageError::ArchiveOpen { .. })));
    }

    #[test]
    fn test_empty_archive() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let work = workspace(&temp);
        let data = ProjectArchiveBuilder::new().build_tar_gz();
        let archive = write_archive(temp.path(), "empty.tar.gz", &data);

        let result = extract_project(&archive, &work, &Logger::discard());
        assert!(matches!(result, Err(StageError::EmptyArchive { .. })));
    }

    #[test]
    fn test_member_path_rules() {
        assert_eq!(
            member_path(Path::new("./proj/a.c")).unwrap(),
            PathBuf::from("proj/a.c")
        );
        assert!(member_path(Path::new("../evil")).is_err());
        assert!(member_path(Path::new("proj/../../evil")).is_err());
        assert!(member_path(Path::new("proj/../inside")).is_err());
        assert!(member_path(Path::new("/etc/passwd")).is_err());
    }
}
