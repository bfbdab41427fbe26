use crate::cmd::open_board;
use crate::output::print_json;
use board_core::deps::{self, LinkOutcome};
use std::path::Path;

pub fn link(root: &Path, id: &str, blocked_by: &str, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let outcome = deps::link(&mut board, id, blocked_by)?;
    report(&outcome, id, blocked_by, "linked", json)
}

pub fn unlink(root: &Path, id: &str, blocked_by: &str, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let outcome = deps::unlink(&mut board, id, blocked_by)?;
    report(&outcome, id, blocked_by, "unlinked", json)
}

fn report(
    outcome: &LinkOutcome,
    id: &str,
    blocked_by: &str,
    action: &str,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "action": action,
            "blocked": id,
            "blocker": blocked_by,
            "changed": outcome.changed,
            "parent_links": outcome.parent_links,
        }));
    }
    if !outcome.changed {
        println!("{id} is already blocked by {blocked_by}");
        return Ok(());
    }
    match action {
        "linked" => println!("{id} is now blocked by {blocked_by}"),
        _ => println!("{id} is no longer blocked by {blocked_by}"),
    }
    for edge in &outcome.parent_links {
        println!("  {action} parents: {} / {}", edge.blocked, edge.blocker);
    }
    Ok(())
}
