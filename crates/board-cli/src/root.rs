use board_core::paths::BOARD_DIR;
use std::path::{Path, PathBuf};

/// Resolve the project root; the board itself lives in `<root>/.board`.
///
/// Priority:
/// 1. `--root` flag / `BOARD_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.board/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, BOARD_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

/// First ancestor of `start` (inclusive) containing a `marker` directory.
fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_board_dir_above_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".board")).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(find_upward(&subdir, ".board").as_deref(), Some(dir.path()));
    }

    #[test]
    fn board_marker_beats_git_marker() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let inner = dir.path().join("app");
        std::fs::create_dir_all(inner.join(".board")).unwrap();
        let deep = inner.join("src");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_upward(&deep, ".board").as_deref(), Some(inner.as_path()));
        assert_eq!(find_upward(&deep, ".git").as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_marker_found() {
        let dir = TempDir::new().unwrap();
        assert!(find_upward(dir.path(), "board-no-such-marker").is_none());
    }
}
