//! Path math used when rewriting manifests.

use std::path::{Component, Path, PathBuf};

/// Express `path` relative to `base` using `..` components where needed.
///
/// Both paths are interpreted lexically; neither is touched on disk. Rewritten
/// manifests must reference artifacts and shared directories by relative path
/// so the generated workspace stays relocatable.
#[must_use]
pub fn relative_from(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component<'_>> = path.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &path[common..] {
        result.push(component);
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// The file stem of a path as a string, or an empty string if it has none.
#[must_use]
pub fn stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}

/// The final path component as a string, or an empty string if it has none.
#[must_use]
pub fn basename(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_from_sibling() {
        assert_eq!(
            relative_from(Path::new("/a/b/c"), Path::new("/a/b/d")),
            PathBuf::from("../c")
        );
    }

    #[test]
    fn relative_from_descendant() {
        assert_eq!(
            relative_from(Path::new("/a/b/c"), Path::new("/a")),
            PathBuf::from("b/c")
        );
    }

    #[test]
    fn relative_from_ancestor() {
        assert_eq!(
            relative_from(Path::new("/a"), Path::new("/a/b/c")),
            PathBuf::from("../..")
        );
    }

    #[test]
    fn relative_from_same_path() {
        assert_eq!(
            relative_from(Path::new("/a/b"), Path::new("/a/b")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn relative_from_disjoint() {
        assert_eq!(
            relative_from(Path::new("/x/y"), Path::new("/a/b")),
            PathBuf::from("../../x/y")
        );
    }

    #[test]
    fn stem_and_basename() {
        assert_eq!(stem(Path::new("/p/Foo.lib")), "Foo");
        assert_eq!(basename(Path::new("/p/Foo.lib")), "Foo.lib");
    }
}
