use crate::cmd::open_board;
use crate::output::{print_json, print_table, status_label};
use anyhow::Context;
use board_core::codec::format_instant;
use board_core::lifecycle::{self, NewItem, ReadmeEdit};
use board_core::{Board, Item, ItemType, Status};
use std::path::Path;

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

pub struct CreateArgs {
    pub kind: ItemType,
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    pub epic: Option<String>,
    pub story: Option<String>,
}

pub fn create(root: &Path, args: CreateArgs, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let parent = match args.kind {
        ItemType::Story => args.epic,
        ItemType::Task | ItemType::Bug => args.story,
        ItemType::Epic => args.epic.or(args.story),
    };
    let item = lifecycle::create(
        &mut board,
        args.kind,
        NewItem {
            name: args.name,
            title: args.title,
            description: args.description,
            parent,
        },
    )
    .with_context(|| format!("failed to create {}", args.kind))?;

    if json {
        print_json(&item)?;
    } else {
        println!("Created {} {}: {}", item.item_type, item.id, item.title());
        println!("  path: {}", item.path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show / list
// ---------------------------------------------------------------------------

pub fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let board = open_board(root)?;
    let item = board.find_by_id(id)?;
    if json {
        let children: Vec<&str> = board.children_of(&item.id).iter().map(|c| c.id.as_str()).collect();
        print_json(&serde_json::json!({ "item": item, "children": children }))?;
        return Ok(());
    }

    let p = &item.progress;
    println!("{} [{}] {}", item.id, item.item_type, item.title());
    println!("  status:      {}", status_label(p.status));
    println!("  assigned to: {}", p.assignee.as_deref().unwrap_or("-"));
    if let Some(parent) = &item.parent_id {
        println!("  parent:      {parent}");
    }
    if let Some(t) = &p.created_at {
        println!("  created:     {}", format_instant(t));
    }
    if let Some(t) = &p.last_update {
        println!("  updated:     {}", format_instant(t));
    }
    println!("  path:        {}", item.path.display());
    print_refs(&board, "blocked by", item.blocked_by());
    print_refs(&board, "blocks", item.blocks());

    for (heading, body) in [
        ("Description", &item.readme.description),
        ("Scope", &item.readme.scope),
        ("Acceptance Criteria", &item.readme.acceptance_criteria),
    ] {
        if !body.is_empty() {
            println!("\n{heading}:\n{body}");
        }
    }
    if !p.checklist.is_empty() {
        println!("\nChecklist:");
        for (i, c) in p.checklist.iter().enumerate() {
            let mark = if c.checked { "x" } else { " " };
            println!("  {}. [{mark}] {}", i + 1, c.text);
        }
    }
    if !p.notes.is_empty() {
        println!("\nNotes:\n{}", p.notes);
    }
    let children = board.children_of(&item.id);
    if !children.is_empty() {
        println!("\nChildren:");
        for c in children {
            println!("  {} {} ({})", c.id, c.title(), c.status());
        }
    }
    Ok(())
}

fn print_refs(board: &Board, label: &str, ids: &[String]) {
    if ids.is_empty() {
        return;
    }
    println!("  {label}:");
    for id in ids {
        match board.get(id) {
            Some(other) => println!("    {} ({})", id, other.status()),
            None => println!("    {id} (missing)"),
        }
    }
}

pub fn list(
    root: &Path,
    kind: Option<ItemType>,
    status: Option<Status>,
    json: bool,
) -> anyhow::Result<()> {
    let board = open_board(root)?;
    let filtered = kind.is_some() || status.is_some();
    let items: Vec<&Item> = board
        .items()
        .iter()
        .filter(|i| kind.map_or(true, |k| i.item_type == k))
        .filter(|i| status.map_or(true, |s| i.status() == s))
        .collect();

    if json {
        let rows: Vec<_> = items
            .iter()
            .map(|i| {
                serde_json::json!({
                    "id": i.id,
                    "type": i.item_type,
                    "title": i.title(),
                    "status": i.status(),
                    "parent": i.parent_id,
                    "assignee": i.progress.assignee,
                })
            })
            .collect();
        print_json(&rows)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }
    if filtered {
        let rows = items
            .iter()
            .map(|i| {
                vec![
                    i.id.clone(),
                    i.item_type.to_string(),
                    status_label(i.status()),
                    i.title().to_string(),
                ]
            })
            .collect();
        print_table(&["ID", "TYPE", "STATUS", "TITLE"], rows);
        return Ok(());
    }

    // Full tree, epics first in load order.
    for item in items {
        let depth = item.item_type.depth();
        println!(
            "{}{} {} [{}]",
            "  ".repeat(depth),
            item.id,
            item.title(),
            status_label(item.status())
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// edit / delete / move
// ---------------------------------------------------------------------------

pub fn edit(root: &Path, id: &str, edit: ReadmeEdit, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let item = lifecycle::edit_readme(&mut board, id, edit)
        .with_context(|| format!("failed to edit {id}"))?;
    if json {
        print_json(&item.readme)?;
    } else {
        println!("Updated {}: {}", item.id, item.title());
    }
    Ok(())
}

pub fn delete(root: &Path, id: &str, force: bool, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let outcome = lifecycle::delete(&mut board, id, force)?;
    if json {
        print_json(&outcome)?;
        return Ok(());
    }
    println!("Deleted {}", outcome.removed.join(", "));
    if !outcome.scrubbed.is_empty() {
        println!("  references removed from: {}", outcome.scrubbed.join(", "));
    }
    for edge in &outcome.parent_links {
        println!("  de-escalated: {} no longer blocked by {}", edge.blocked, edge.blocker);
    }
    Ok(())
}

pub fn move_item(root: &Path, id: &str, to: &str, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let outcome = lifecycle::move_item(&mut board, id, to)?;
    if json {
        print_json(&outcome)?;
        return Ok(());
    }
    match &outcome.from {
        Some(from) if from == &outcome.to => println!("{} is already under {}", outcome.id, outcome.to),
        Some(from) => println!("Moved {} from {} to {}", outcome.id, from, outcome.to),
        None => println!("Moved {} to {}", outcome.id, outcome.to),
    }
    for edge in &outcome.parent_links_added {
        println!("  escalated: {} blocked by {}", edge.blocked, edge.blocker);
    }
    for edge in &outcome.parent_links_removed {
        println!("  de-escalated: {} no longer blocked by {}", edge.blocked, edge.blocker);
    }
    Ok(())
}
