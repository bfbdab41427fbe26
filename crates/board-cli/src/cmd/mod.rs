pub mod init;
pub mod item;
pub mod link;
pub mod plan;
pub mod progress;
pub mod search;
pub mod validate;

use anyhow::Context;
use board_core::{config::BoardConfig, paths, Board};
use std::path::{Path, PathBuf};

/// Load the board under `root`, or explain how to create one.
pub fn open_board(root: &Path) -> anyhow::Result<Board> {
    let dir = board_dir(root);
    Board::load(&dir).with_context(|| format!("cannot open board at {}", dir.display()))
}

pub fn load_config(root: &Path) -> anyhow::Result<BoardConfig> {
    BoardConfig::load(&board_dir(root)).context("failed to read config.yaml")
}

pub fn board_dir(root: &Path) -> PathBuf {
    paths::board_dir(root)
}

// ---------------------------------------------------------------------------
// clap value parsers
// ---------------------------------------------------------------------------

pub fn parse_item_type(s: &str) -> Result<board_core::ItemType, String> {
    s.parse().map_err(|e: board_core::BoardError| e.to_string())
}

pub fn parse_status(s: &str) -> Result<board_core::Status, String> {
    s.parse().map_err(|e: board_core::BoardError| e.to_string())
}
