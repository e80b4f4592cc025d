//! JWalk-based directory walker.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use hashwatch_core::{ScanError, ScanWarning, WarningKind};

/// Files found by one walk of the tree.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Paths of every candidate file, in visitation order.
    pub files: Vec<PathBuf>,
    /// Directories or entries that could not be read.
    pub warnings: Vec<ScanWarning>,
}

/// Enumerates the files under a root, minus the ignore set.
///
/// The walk is serial and sorted so two walks of an unchanged tree visit
/// paths in the same order. Symbolic links are never descended; a link
/// to anything other than a directory is reported as a file. Sockets,
/// FIFOs and device nodes are skipped, since opening them for reading
/// can block.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    ignore: HashSet<String>,
}

impl TreeWalker {
    /// Create a walker that skips files whose bare name is in `ignore`.
    pub fn new(ignore: HashSet<String>) -> Self {
        Self { ignore }
    }

    /// Check if a bare file name is ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }

    /// Walk the tree under `root`.
    ///
    /// Fails when the root itself is missing, not a directory or cannot be
    /// listed; unreadable subdirectories become warnings.
    pub fn walk(&self, root: &Path) -> Result<WalkOutcome, ScanError> {
        ensure_root(root)?;

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        let mut outcome = WalkOutcome::default();

        for entry_result in walker {
            let mut entry = match entry_result {
                Ok(e) => e,
                Err(err) if err.depth() == 0 => return Err(root_error(root, err)),
                Err(err) => {
                    outcome.warnings.push(read_warning(err));
                    continue;
                }
            };

            // Directory listing failures are attached to the directory's entry
            if let Some(err) = entry.read_children_error.take() {
                if entry.depth() == 0 {
                    return Err(root_error(root, err));
                }
                outcome.warnings.push(read_warning(err));
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.path();
            if file_type.is_symlink() {
                if path.is_dir() {
                    continue;
                }
            } else if !file_type.is_file() {
                tracing::debug!(path = %path.display(), "Skipping special file");
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if self.is_ignored(&file_name) {
                continue;
            }

            outcome.files.push(path);
        }

        Ok(outcome)
    }
}

/// Verify the root exists, is a directory and can be listed.
pub fn ensure_root(root: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|e| ScanError::io(root, e))?;
    Ok(())
}

fn root_error(root: &Path, err: jwalk::Error) -> ScanError {
    let message = err.to_string();
    let source = err.into_io_error().unwrap_or_else(|| io::Error::other(message));
    ScanError::io(root, source)
}

fn read_warning(err: jwalk::Error) -> ScanWarning {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    tracing::warn!(path = %path.display(), error = %err, "Failed to read entry");

    let kind = match err.io_error().map(io::Error::kind) {
        Some(io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
        _ => WarningKind::ReadError,
    };
    ScanWarning::new(path, err.to_string(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();
        fs::create_dir(root.join("empty")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join(".hidden"), "dot").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir1/.DS_Store"), "noise").unwrap();

        temp
    }

    fn ignore(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_walk_finds_nested_and_hidden_files() {
        let temp = create_test_tree();
        let walker = TreeWalker::default();

        let outcome = walker.walk(temp.path()).unwrap();
        assert_eq!(outcome.files.len(), 5);
        assert!(outcome.files.contains(&temp.path().join(".hidden")));
        assert!(outcome.files.contains(&temp.path().join("dir1/subdir/file3.txt")));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_walk_skips_ignored_names() {
        let temp = create_test_tree();
        let walker = TreeWalker::new(ignore(&[".DS_Store", "file2.txt"]));

        let outcome = walker.walk(temp.path()).unwrap();
        assert_eq!(outcome.files.len(), 3);
        assert!(!outcome.files.iter().any(|p| p.ends_with(".DS_Store")));
        assert!(!outcome.files.iter().any(|p| p.ends_with("file2.txt")));
    }

    #[test]
    fn test_ignore_matches_base_name_only() {
        let temp = create_test_tree();
        // A directory name in the ignore set does not hide its files
        let walker = TreeWalker::new(ignore(&["dir1"]));

        let outcome = walker.walk(temp.path()).unwrap();
        assert_eq!(outcome.files.len(), 5);
    }

    #[test]
    fn test_walk_order_is_stable() {
        let temp = create_test_tree();
        let walker = TreeWalker::default();

        let first = walker.walk(temp.path()).unwrap().files;
        let second = walker.walk(temp.path()).unwrap().files;
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let walker = TreeWalker::default();

        let err = walker.walk(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let err = TreeWalker::default().walk(&file).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let temp = create_test_tree();
        let root = temp.path();
        std::os::unix::fs::symlink(root.join("dir1"), root.join("link_dir")).unwrap();
        std::os::unix::fs::symlink(root.join("file1.txt"), root.join("link_file")).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("broken")).unwrap();

        let outcome = TreeWalker::default().walk(root).unwrap();
        assert!(outcome.files.contains(&root.join("link_file")));
        assert!(outcome.files.contains(&root.join("broken")));
        assert!(!outcome.files.iter().any(|p| p.starts_with(root.join("link_dir"))));
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_root_is_fatal() {
        let temp = create_test_tree();
        let root = temp.path();
        set_mode(root, 0o311);

        // Privileged users can list it anyway
        let listable = fs::read_dir(root).is_ok();
        let checked = ensure_root(root);
        let walked = TreeWalker::default().walk(root);
        set_mode(root, 0o755);
        if listable {
            return;
        }

        assert!(matches!(checked, Err(ScanError::PermissionDenied { .. })));
        assert!(matches!(walked, Err(ScanError::PermissionDenied { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_subdirectory_is_a_warning() {
        let temp = create_test_tree();
        let locked = temp.path().join("dir1/subdir");
        set_mode(&locked, 0o311);

        let listable = fs::read_dir(&locked).is_ok();
        let result = TreeWalker::default().walk(temp.path());
        set_mode(&locked, 0o755);
        if listable {
            return;
        }

        let outcome = result.unwrap();
        assert!(!outcome.files.contains(&locked.join("file3.txt")));
        assert!(outcome.files.contains(&temp.path().join("dir1/file2.txt")));
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::PermissionDenied);
    }
}
