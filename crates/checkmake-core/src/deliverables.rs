//! Deliverable checks run after a successful build.

use crate::Logger;
use crate::StageError;
use crate::StageResult;
use std::fs;
use std::path::Component;
use std::path::Path;

/// Documentation file every project must ship.
pub const README_FILE: &str = "README.txt";

/// Checks that `README.txt` exists directly under `project_dir` and is a
/// non-empty regular file.
///
/// # Errors
///
/// - [`StageError::ReadmeMissing`] if it cannot be found
/// - [`StageError::ReadmeNotFile`] if it is a directory or other non-file
/// - [`StageError::ReadmeEmpty`] if its size is zero
pub fn check_readme(project_dir: &Path, log: &Logger) -> StageResult<()> {
    let path = project_dir.join(README_FILE);
    log.info(format!("Checking documentation file {}", path.display()));

    let metadata = fs::metadata(&path).map_err(|source| StageError::ReadmeMissing {
        path: path.clone(),
        source,
    })?;

    if !metadata.is_file() {
        return Err(StageError::ReadmeNotFile { path });
    }
    if metadata.len() == 0 {
        return Err(StageError::ReadmeEmpty { path });
    }

    log.info(format!("{README_FILE} present ({} bytes)", metadata.len()));
    Ok(())
}

/// Checks that a file named `name` exists directly under `project_dir`.
///
/// Only existence is checked; an empty artifact passes.
///
/// # Errors
///
/// - [`StageError::ArtifactName`] if `name` is not a single plain file name
/// - [`StageError::ArtifactMissing`] if nothing exists at that path
pub fn check_artifact(project_dir: &Path, name: &str, log: &Logger) -> StageResult<()> {
    if !is_plain_file_name(name) {
        return Err(StageError::ArtifactName {
            name: name.to_string(),
        });
    }

    let path = project_dir.join(name);
    log.info(format!("Checking target artifact {}", path.display()));

    fs::metadata(&path).map_err(|source| StageError::ArtifactMissing {
        name: name.to_string(),
        path: path.clone(),
        source,
    })?;

    log.info(format!("Target {name} present"));
    Ok(())
}

/// Exactly one normal component: no separators, no `.`/`..`, not absolute.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_readme_present() {
        let temp = TempDir::new().expect("failed to create temp dir");
        fs::write(temp.path().join(README_FILE), "docs\n").unwrap();
        assert!(check_readme(temp.path(), &Logger::discard()).is_ok());
    }

    #[test]
    fn test_readme_missing() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let result = check_readme(temp.path(), &Logger::discard());
        assert!(matches!(result, Err(StageError::ReadmeMissing { .. })));
    }

    #[test]
    fn test_readme_empty() {
        let temp = TempDir::new().expect("failed to create temp dir");
        fs::write(temp.path().join(README_FILE), "").unwrap();
        let result = check_readme(temp.path(), &Logger::discard());
        assert!(matches!(result, Err(StageError::ReadmeEmpty { .. })));
    }

    #[test]
    fn test_readme_directory_rejected() {
        let temp = TempDir::new().expect("failed to create temp dir");
        fs::create_dir(temp.path().join(README_FILE)).unwrap();
        let result = check_readme(temp.path(), &Logger::discard());
        assert!(matches!(result, Err(StageError::ReadmeNotFile { .. })));
    }

    #[test]
    fn test_readme_must_be_at_top_level() {
        let temp = TempDir::new().expect("failed to create temp dir");
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs").join(README_FILE), "docs").unwrap();
        let result = check_readme(temp.path(), &Logger::discard());
        assert!(matches!(result, Err(StageError::ReadmeMissing { .. })));
    }

    #[test]
    fn test_artifact_present_even_if_empty() {
        let temp = TempDir::new().expect("failed to create temp dir");
        fs::write(temp.path().join("hello"), "").unwrap();
        assert!(check_artifact(temp.path(), "hello", &Logger::discard()).is_ok());
    }

    #[test]
    fn test_artifact_missing() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let result = check_artifact(temp.path(), "hello", &Logger::discard());
        match result {
            Err(StageError::ArtifactMissing { name, path, .. }) => {
                assert_eq!(name, "hello");
                assert_eq!(path, temp.path().join("hello"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_artifact_name_must_stay_in_project() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let project = temp.path().join("proj");
        fs::create_dir(&project).unwrap();
        fs::write(temp.path().join("outside"), "x").unwrap();

        for name in ["/etc/passwd", "../outside", "sub/hello", ".", ".."] {
            let result = check_artifact(&project, name, &Logger::discard());
            assert!(
                matches!(result, Err(StageError::ArtifactName { .. })),
                "target {name:?} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("hello"));
        assert!(is_plain_file_name("hello.bin"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("./hello/x"));
        assert!(!is_plain_file_name("/hello"));
    }
}
