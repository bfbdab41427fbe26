use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const BOARD_DIR: &str = ".board";

pub const README_FILE: &str = "README.md";
pub const PROGRESS_FILE: &str = "progress.md";
pub const SYSTEM_FILE: &str = "system.md";
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// The board directory for a project root.
pub fn board_dir(root: &Path) -> PathBuf {
    root.join(BOARD_DIR)
}

pub fn readme_path(item_dir: &Path) -> PathBuf {
    item_dir.join(README_FILE)
}

pub fn progress_path(item_dir: &Path) -> PathBuf {
    item_dir.join(PROGRESS_FILE)
}

pub fn system_path(board: &Path) -> PathBuf {
    board.join(SYSTEM_FILE)
}

pub fn config_path(board: &Path) -> PathBuf {
    board.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        let board = board_dir(root);
        assert_eq!(board, PathBuf::from("/tmp/proj/.board"));
        assert_eq!(
            config_path(&board),
            PathBuf::from("/tmp/proj/.board/config.yaml")
        );
        assert_eq!(
            system_path(&board),
            PathBuf::from("/tmp/proj/.board/system.md")
        );
        let item = board.join("EPIC-260101-abc123_auth");
        assert_eq!(
            progress_path(&item),
            PathBuf::from("/tmp/proj/.board/EPIC-260101-abc123_auth/progress.md")
        );
    }
}
