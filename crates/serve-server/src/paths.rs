//! Path containment checks.
//!
//! Every request path is resolved against the served root before any
//! filesystem access, and nothing outside the root is ever served. The
//! resolution here is purely lexical: no symlinks are followed and no
//! `stat` calls are made.

use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, lexically cleaned form.
///
/// Relative paths are joined onto the current working directory. `.`
/// segments are dropped and `..` segments applied without touching the
/// filesystem; popping never goes past the root. Returns `None` only when
/// the current working directory cannot be determined.
#[must_use]
pub fn normalize_path(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => clean.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // pop() stops at the root, so `..` can never escape it.
                clean.pop();
            }
            Component::Normal(name) => clean.push(name),
        }
    }
    Some(clean)
}

/// Check whether `path` is inside `dir`.
///
/// Both are normalized independently; the directory itself counts as
/// inside. Normalization failure denies.
#[must_use]
pub fn is_within(path: &Path, dir: &Path) -> bool {
    let (Some(path), Some(dir)) = (normalize_path(path), normalize_path(dir)) else {
        return false;
    };
    // Component-wise prefix test: equality is allowed, /a/bc is not under /a/b.
    path.starts_with(&dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(path: &str, dir: &str, expected: bool) {
        assert_eq!(
            is_within(Path::new(path), Path::new(dir)),
            expected,
            "is_within({path}, {dir})"
        );
    }

    #[test]
    fn test_is_within() {
        check("/home/user/.config", "/home/user", true);
        check("/home/user/.config", "/home/user/", true);
        check("/home/user/.config", "/home/user/.config", true);
        check("/home/user/.config", "/home/user/.config/", true);
        check("/home/user/.config", "/home/user/.config/.", true);
        check("/home/user/.config", "/home/user/.config/..", true);
        check("/home/user/.config", "/home/user/.config/../../", true);
        check("/home/user/.config/..", "/home/user/", true);
        check("./a/b/c", "./a/b", true);
        check("./a/b/c/../d/./e", "./a/b/c/..", true);

        check("./a", "./a/b/c/..", false);
        check("./a/b/c/..", "./d", false);
        check("./a/b/c/../..", "./a/b/c/..", false);
        check("/a/b/c/../..", "/a/b/c/..", false);
    }

    #[test]
    fn test_is_within_rejects_sibling_prefix() {
        check("/srv/www-secrets", "/srv/www", false);
    }

    #[test]
    fn test_normalize_collapses_segments() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c")),
            Some(PathBuf::from("/a/c"))
        );
        assert_eq!(
            normalize_path(Path::new("/a/./b//c")),
            Some(PathBuf::from("/a/b/c"))
        );
    }

    #[test]
    fn test_normalize_stops_at_root() {
        assert_eq!(
            normalize_path(Path::new("/../../etc/passwd")),
            Some(PathBuf::from("/etc/passwd"))
        );
    }

    #[test]
    fn test_normalize_makes_relative_absolute() {
        let normalized = normalize_path(Path::new("some/dir")).unwrap();
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("some/dir"));
    }
}
