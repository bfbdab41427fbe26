//! Regex search over item files.

use crate::board::Board;
use crate::error::{BoardError, Result};
use crate::io::read_or_empty;
use crate::paths::{self, PROGRESS_FILE, README_FILE};
use crate::types::ItemType;
use regex::RegexBuilder;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub item_type: ItemType,
    pub file: &'static str,
    /// 1-based.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub item_type: Option<ItemType>,
    pub ignore_case: bool,
}

/// Every matching line of every item's `README.md` and `progress.md`, in
/// board load order.
pub fn search(board: &Board, pattern: &str, opts: &SearchOptions) -> Result<Vec<SearchHit>> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(opts.ignore_case)
        .build()
        .map_err(|e| BoardError::InvalidPattern(format!("{pattern}: {e}")))?;

    let mut hits = Vec::new();
    for item in board.items() {
        if opts.item_type.is_some_and(|t| t != item.item_type) {
            continue;
        }
        let files = [
            (README_FILE, paths::readme_path(&item.path)),
            (PROGRESS_FILE, paths::progress_path(&item.path)),
        ];
        for (file, path) in files {
            let text = read_or_empty(&path)?;
            for (n, line) in text.lines().enumerate() {
                if re.is_match(line) {
                    hits.push(SearchHit {
                        id: item.id.clone(),
                        item_type: item.item_type,
                        file,
                        line: n + 1,
                        text: line.trim_end().to_string(),
                    });
                }
            }
        }
    }
    tracing::debug!(pattern, hits = hits.len(), "search finished");
    Ok(hits)
}
