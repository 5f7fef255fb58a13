//! Containment tests for archive extraction.
//!
//! Every archive here tries to place something outside the workspace and
//! must be rejected without writing there.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use checkmake_core::Logger;
use checkmake_core::StageError;
use checkmake_core::extract::extract_project;
use checkmake_core::test_utils::ProjectArchiveBuilder;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup(data: &[u8]) -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = temp.path().join("submission.tar.gz");
    fs::write(&archive, data).unwrap();
    let work = temp.path().join("work");
    fs::create_dir(&work).unwrap();
    (temp, archive, work)
}

#[test]
fn test_parent_traversal_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_raw_file("../escape.txt", b"pwned")
        .build_tar_gz();
    let (temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::UnsafeMember { .. }), "{err:?}");
    assert!(err.is_containment_violation());
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_nested_traversal_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_raw_file("proj/../../escape.txt", b"pwned")
        .build_tar_gz();
    let (temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::UnsafeMember { .. }), "{err:?}");
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_absolute_member_rejected() {
    let outside = TempDir::new().expect("failed to create temp dir");
    let target = outside.path().join("abs.txt");
    let data = ProjectArchiveBuilder::new()
        .add_raw_file(target.to_str().unwrap(), b"pwned")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::UnsafeMember { .. }), "{err:?}");
    assert!(!target.exists());
}

#[test]
fn test_escaping_symlink_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_symlink("proj/link", "../../outside")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::LinkEscape { .. }), "{err:?}");
    assert!(fs::symlink_metadata(work.join("proj/link")).is_err());
}

#[cfg(unix)]
#[test]
fn test_symlink_chain_through_earlier_link_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_symlink("proj/a", ".")
        .add_symlink("proj/b", "a/../..")
        .add_file("proj/README.txt", b"docs")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::LinkEscape { .. }), "{err:?}");
    assert!(err.is_containment_violation());
    assert!(fs::symlink_metadata(work.join("proj/b")).is_err());
}

#[cfg(unix)]
#[test]
fn test_symlink_chain_through_later_link_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_symlink("proj/b", "a/../..")
        .add_symlink("proj/a", ".")
        .add_file("proj/README.txt", b"docs")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    match err {
        StageError::LinkEscape { path, .. } => assert_eq!(path, PathBuf::from("proj/b")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_hardlink_through_symlink_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_symlink("proj/a", ".")
        .add_hardlink("proj/h", "proj/a/../../secret")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::LinkEscape { .. }), "{err:?}");
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_inside_project_allowed() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_symlink("proj/hello", "build/hello")
        .add_file("proj/README.txt", b"docs")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    extract_project(&archive, &work, &Logger::discard()).unwrap();
    assert!(fs::symlink_metadata(work.join("proj/hello")).is_ok());
}

#[test]
fn test_absolute_symlink_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_symlink("proj/passwd", "/etc/passwd")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::LinkEscape { .. }), "{err:?}");
}

#[test]
fn test_escaping_hardlink_rejected() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_hardlink("proj/secret", "../secret")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let err = extract_project(&archive, &work, &Logger::discard()).unwrap_err();
    assert!(matches!(err, StageError::LinkEscape { .. }), "{err:?}");
}

#[cfg(unix)]
#[test]
fn test_symlink_inside_project_allowed() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_directory("proj/lib/")
        .add_file("proj/lib/a.txt", b"a")
        .add_directory("proj/bin/")
        .add_symlink("proj/bin/a.txt", "../lib/a.txt")
        .add_file("proj/README.txt", b"docs")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    let extraction = extract_project(&archive, &work, &Logger::discard()).unwrap();
    assert_eq!(extraction.project_dir, work.join("proj"));
    assert_eq!(fs::read_to_string(work.join("proj/bin/a.txt")).unwrap(), "a");
}

#[test]
fn test_hardlink_inside_project_allowed() {
    let data = ProjectArchiveBuilder::new()
        .add_directory("proj/")
        .add_file("proj/a.txt", b"a")
        .add_hardlink("proj/b.txt", "proj/a.txt")
        .build_tar_gz();
    let (_temp, archive, work) = setup(&data);

    extract_project(&archive, &work, &Logger::discard()).unwrap();
    assert_eq!(fs::read_to_string(work.join("proj/b.txt")).unwrap(), "a");
}
