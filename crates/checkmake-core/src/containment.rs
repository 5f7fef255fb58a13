//! Path containment checks.
//!
//! All checks here are lexical: paths are made absolute against the current
//! directory and `.`/`..` components are folded away without touching the
//! filesystem, so they work for paths that do not exist yet.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Resolves `path` to an absolute path with `.` and `..` folded away.
///
/// `..` at the root stays at the root, as on POSIX.
///
/// # Errors
///
/// Returns an error if `path` is empty or the current directory cannot be
/// determined.
///
/// # Examples
///
/// ```
/// use checkmake_core::containment::normalize;
///
/// let path = normalize("/srv/work/../work/./proj").unwrap();
/// assert_eq!(path, std::path::PathBuf::from("/srv/work/proj"));
/// ```
pub fn normalize(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path.as_ref())?;
    let mut normalized = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component);
            }
        }
    }

    Ok(normalized)
}

/// Returns `true` if `child` lies in the subtree rooted at `parent`.
///
/// Both paths are normalized first; the comparison is component-wise, so
/// `/work` does not contain `/workshop`. A path contains itself. Paths
/// that cannot be resolved are never contained.
///
/// # Examples
///
/// ```
/// use checkmake_core::containment::path_is_parent;
///
/// assert!(path_is_parent("/srv", "/srv/work/proj"));
/// assert!(path_is_parent("/srv", "/srv"));
/// assert!(!path_is_parent("/srv/work", "/srv/workshop"));
/// assert!(!path_is_parent("./work", "/"));
/// ```
#[must_use]
pub fn path_is_parent(parent: impl AsRef<Path>, child: impl AsRef<Path>) -> bool {
    match (normalize(parent), normalize(child)) {
        (Ok(parent), Ok(child)) => child.starts_with(parent),
        _ => false,
    }
}

/// Returns `true` if `child` is inside `parent` and is not `parent` itself.
///
/// # Examples
///
/// ```
/// use checkmake_core::containment::is_strictly_inside;
///
/// assert!(is_strictly_inside("/srv", "/srv/work"));
/// assert!(!is_strictly_inside("/srv", "/srv/."));
/// ```
#[must_use]
pub fn is_strictly_inside(parent: impl AsRef<Path>, child: impl AsRef<Path>) -> bool {
    match (normalize(parent), normalize(child)) {
        (Ok(parent), Ok(child)) => child != parent && child.starts_with(parent),
        _ => false,
    }
}

/// Resolves a relative `path` against `base`, both relative to some root,
/// and returns the result if it never climbs above that root.
///
/// Used for archive members and link targets, which must stay under the
/// workspace even before anything exists on disk.
///
/// # Examples
///
/// ```
/// use checkmake_core::containment::resolve_within;
/// use std::path::Path;
///
/// let resolved = resolve_within(Path::new("proj/bin"), Path::new("../lib/a.so"));
/// assert_eq!(resolved.as_deref(), Some(Path::new("proj/lib/a.so")));
///
/// assert!(resolve_within(Path::new("proj"), Path::new("../../etc/passwd")).is_none());
/// assert!(resolve_within(Path::new(""), Path::new("/etc/passwd")).is_none());
/// ```
#[must_use]
pub fn resolve_within(base: &Path, path: &Path) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in base.components().chain(path.components()) {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(resolved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative_uses_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(normalize("./work").unwrap(), cwd.join("work"));
        assert_eq!(normalize("work/../work/proj").unwrap(), cwd.join("work/proj"));
    }

    #[test]
    fn test_normalize_parent_at_root() {
        assert_eq!(normalize("/../..").unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn test_normalize_empty_is_error() {
        assert!(normalize("").is_err());
    }

    #[test]
    fn test_path_is_parent_relative() {
        assert!(path_is_parent(".", "./work"));
        assert!(path_is_parent(".", "work/deeper/still"));
        assert!(path_is_parent(".", "."));
    }

    #[test]
    fn test_path_is_parent_rejects_escapes() {
        assert!(!path_is_parent(".", "/"));
        assert!(!path_is_parent(".", ".."));
        assert!(!path_is_parent(".", "work/../../elsewhere"));
        assert!(!path_is_parent("./work", "/"));
    }

    #[test]
    fn test_path_is_parent_component_boundary() {
        assert!(!path_is_parent("/srv/work", "/srv/work2"));
        assert!(path_is_parent("/srv/work", "/srv/work/2"));
    }

    #[test]
    fn test_is_strictly_inside() {
        assert!(is_strictly_inside(".", "./work"));
        assert!(!is_strictly_inside(".", "."));
        assert!(!is_strictly_inside(".", "work/.."));
        assert!(!is_strictly_inside(".", "/"));
        assert!(!is_strictly_inside(".", ""));
    }

    #[test]
    fn test_resolve_within() {
        assert_eq!(
            resolve_within(Path::new(""), Path::new("./proj/README.txt")),
            Some(PathBuf::from("proj/README.txt"))
        );
        assert_eq!(
            resolve_within(Path::new("a/b"), Path::new("../../c")),
            Some(PathBuf::from("c"))
        );
        assert_eq!(resolve_within(Path::new("a/b"), Path::new("../../../c")), None);
        assert_eq!(resolve_within(Path::new(""), Path::new("..")), None);
        assert_eq!(resolve_within(Path::new(""), Path::new("/abs")), None);
    }

    #[test]
    fn test_resolve_within_dot_only() {
        assert_eq!(
            resolve_within(Path::new(""), Path::new("./")),
            Some(PathBuf::new())
        );
    }
}
