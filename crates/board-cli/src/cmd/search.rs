use crate::cmd::open_board;
use crate::output::print_json;
use board_core::search::{search, SearchOptions};
use board_core::ItemType;
use std::path::Path;

pub fn run(
    root: &Path,
    pattern: &str,
    item_type: Option<ItemType>,
    ignore_case: bool,
    json: bool,
) -> anyhow::Result<()> {
    let board = open_board(root)?;
    let hits = search(&board, pattern, &SearchOptions { item_type, ignore_case })?;

    if json {
        return print_json(&hits);
    }
    if hits.is_empty() {
        println!("No matches for '{pattern}'.");
        return Ok(());
    }
    for hit in &hits {
        println!("{} {}:{}: {}", hit.id, hit.file, hit.line, hit.text);
    }
    Ok(())
}
