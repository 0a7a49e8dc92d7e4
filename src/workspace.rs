//! Project root discovery for config manifest lookup.

use std::path::{Path, PathBuf};

use git2::Repository;
use log::debug;

/// The git working directory containing `cwd`, or `cwd` itself outside a repo.
///
/// Project manifests are collected from this root down to `cwd`.
pub fn project_root(cwd: &Path) -> PathBuf {
    match Repository::discover(cwd) {
        Ok(repo) => match repo.workdir() {
            Some(workdir) => workdir.to_path_buf(),
            None => {
                debug!("bare repository at {}, using cwd", repo.path().display());
                cwd.to_path_buf()
            }
        },
        Err(e) => {
            debug!("no git repository above {}: {}", cwd.display(), e.message());
            cwd.to_path_buf()
        }
    }
}

/// Path relative to the project root for messages, falling back to the full path.
pub fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_outside_repo_is_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let root = project_root(dir.path());
        // A temp dir may itself live inside a repository on some machines
        assert!(dir.path().starts_with(&root) || root == dir.path());
    }

    #[test]
    fn test_project_root_finds_repo() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("notes").join("daily");
        std::fs::create_dir_all(&nested).unwrap();

        let root = project_root(&nested);
        assert_eq!(
            root.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_display_relative() {
        let cases = vec![
            ("/repo", "/repo/notes/today.md", "notes/today.md"),
            ("/repo", "/elsewhere/today.md", "/elsewhere/today.md"),
        ];
        for (root, path, want) in cases {
            let got = display_relative(Path::new(root), Path::new(path));
            assert_eq!(got, want, "display_relative({:?}, {:?})", root, path);
        }
    }
}
