//! Plain per-field edits of `progress.md`. None of these cascade.

use crate::board::Board;
use crate::codec::ChecklistItem;
use crate::error::{BoardError, Result};
use crate::item::Item;

fn edit<'a, F>(board: &'a mut Board, id: &str, f: F) -> Result<&'a Item>
where
    F: FnOnce(&mut Item) -> Result<()>,
{
    let idx = board.index_of(id)?;
    f(board.item_mut(idx))?;
    board.save_progress(idx)?;
    Ok(board.item(idx))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn assign<'a>(board: &'a mut Board, id: &str, assignee: &str) -> Result<&'a Item> {
    let assignee = single_line(assignee);
    if assignee.is_empty() {
        return unassign(board, id);
    }
    edit(board, id, |item| {
        item.progress.assignee = Some(assignee);
        Ok(())
    })
}

pub fn unassign<'a>(board: &'a mut Board, id: &str) -> Result<&'a Item> {
    edit(board, id, |item| {
        item.progress.assignee = None;
        Ok(())
    })
}

pub fn add_checklist_item<'a>(board: &'a mut Board, id: &str, text: &str) -> Result<&'a Item> {
    let text = single_line(text);
    if text.is_empty() {
        return Err(BoardError::InvalidName(text));
    }
    edit(board, id, |item| {
        item.progress.checklist.push(ChecklistItem {
            text,
            checked: false,
        });
        Ok(())
    })
}

/// Check or uncheck the 1-based checklist entry `n`.
pub fn set_checked<'a>(board: &'a mut Board, id: &str, n: usize, checked: bool) -> Result<&'a Item> {
    edit(board, id, |item| {
        let missing = BoardError::NotFound(format!(
            "checklist item {n} of {} ({} items)",
            item.id,
            item.progress.checklist.len()
        ));
        let entry = n
            .checked_sub(1)
            .and_then(|i| item.progress.checklist.get_mut(i))
            .ok_or(missing)?;
        entry.checked = checked;
        Ok(())
    })
}

/// Append a paragraph to the notes.
pub fn append_note<'a>(board: &'a mut Board, id: &str, text: &str) -> Result<&'a Item> {
    let text = text.trim().to_string();
    edit(board, id, |item| {
        if item.progress.notes.is_empty() {
            item.progress.notes = text;
        } else if !text.is_empty() {
            item.progress.notes = format!("{}\n\n{}", item.progress.notes, text);
        }
        Ok(())
    })
}

pub fn set_notes<'a>(board: &'a mut Board, id: &str, text: &str) -> Result<&'a Item> {
    let text = text.trim().to_string();
    edit(board, id, |item| {
        item.progress.notes = text;
        Ok(())
    })
}
