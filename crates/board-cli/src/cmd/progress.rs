use crate::cmd::{open_board, parse_status};
use crate::output::{print_json, status_label};
use anyhow::Context;
use board_core::progress as ops;
use board_core::status::{self, StatusChange};
use board_core::{Board, Item, Status};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProgressSubcommand {
    /// Change an item's status (cascades to parents)
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: Status,
    },
    /// Assign an item to someone
    Assign {
        id: String,
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Clear the assignee
    Unassign { id: String },
    /// Tick checklist entry N (1-based)
    Check { id: String, n: usize },
    /// Untick checklist entry N (1-based)
    Uncheck { id: String, n: usize },
    /// Append a checklist entry
    AddItem {
        id: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Append a paragraph to the notes
    Note {
        id: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Replace the notes
    SetNotes { id: String, text: Vec<String> },
}

pub fn run(root: &Path, subcmd: ProgressSubcommand, json: bool) -> anyhow::Result<()> {
    let mut board = open_board(root)?;
    let (item, what): (&Item, String) = match subcmd {
        ProgressSubcommand::Status { id, status } => return set_status(&mut board, &id, status, json),
        ProgressSubcommand::Assign { id, name } => {
            let name = name.join(" ");
            (ops::assign(&mut board, &id, &name)?, format!("assigned to {name}"))
        }
        ProgressSubcommand::Unassign { id } => (ops::unassign(&mut board, &id)?, "unassigned".into()),
        ProgressSubcommand::Check { id, n } => {
            (ops::set_checked(&mut board, &id, n, true)?, format!("checked item {n}"))
        }
        ProgressSubcommand::Uncheck { id, n } => {
            (ops::set_checked(&mut board, &id, n, false)?, format!("unchecked item {n}"))
        }
        ProgressSubcommand::AddItem { id, text } => (
            ops::add_checklist_item(&mut board, &id, &text.join(" "))?,
            "added checklist item".into(),
        ),
        ProgressSubcommand::Note { id, text } => {
            (ops::append_note(&mut board, &id, &text.join(" "))?, "added note".into())
        }
        ProgressSubcommand::SetNotes { id, text } => {
            (ops::set_notes(&mut board, &id, &text.join(" "))?, "replaced notes".into())
        }
    };

    if json {
        print_json(&serde_json::json!({ "id": item.id, "progress": item.progress }))?;
    } else {
        println!("{}: {what}", item.id);
    }
    Ok(())
}

fn set_status(board: &mut Board, id: &str, to: Status, json: bool) -> anyhow::Result<()> {
    let change = status::set_status(board, id, to)
        .with_context(|| format!("cannot set {id} to {to}"))?;

    if json {
        return print_json(&change);
    }
    print_change(&change);
    Ok(())
}

fn print_change(change: &StatusChange) {
    let t = &change.transition;
    if t.from == t.to {
        println!("{} is already {}", t.id, status_label(t.to));
    } else {
        println!("{}: {} -> {}", t.id, t.from, status_label(t.to));
    }
    for c in &change.cascaded {
        println!("  cascaded {}: {} -> {}", c.id, c.from, status_label(c.to));
    }
    for e in &change.cascade_errors {
        eprintln!("warning: cascade step skipped: {e}");
    }
}
