//! Status transitions and their parent cascades.
//!
//! Entering development, to-review, reviewing or done requires every blocker
//! to be done or closed. Finishing the last open child promotes the parent
//! to done; reactivating a child of a finished parent reopens it. Cascades
//! are best effort: a failed step is logged and reported, never returned as
//! an error, because each step already written is valid on its own.

use crate::board::Board;
use crate::error::{ActiveBlocker, BoardError, Result};
use crate::types::Status;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: String,
    pub from: Status,
    pub to: Status,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub transition: Transition,
    /// Parent changes triggered by this one, child-most first.
    pub cascaded: Vec<Transition>,
    /// Cascade steps that failed and were skipped.
    pub cascade_errors: Vec<String>,
}

/// Items in `blocked_by` that are neither done nor closed.
/// References to items that no longer exist are ignored.
pub fn active_blockers(board: &Board, id: &str) -> Result<Vec<ActiveBlocker>> {
    let item = board.find_by_id(id)?;
    Ok(item
        .blocked_by()
        .iter()
        .filter_map(|b| board.get(b))
        .filter(|b| !b.status().is_complete())
        .map(|b| ActiveBlocker {
            id: b.id.clone(),
            status: b.status().to_string(),
        })
        .collect())
}

pub fn set_status(board: &mut Board, id: &str, status: Status) -> Result<StatusChange> {
    let idx = board.index_of(id)?;
    let item_id = board.item(idx).id.clone();
    let from = board.item(idx).status();

    if from != status && status.requires_unblocked() {
        let blockers = active_blockers(board, &item_id)?;
        if !blockers.is_empty() {
            return Err(BoardError::Blocked {
                id: item_id,
                blockers,
            });
        }
    }

    if from != status {
        board.item_mut(idx).progress.status = status;
        board.save_progress(idx)?;
        tracing::debug!(id = %item_id, %from, to = %status, "status changed");
    }

    let mut change = StatusChange {
        transition: Transition {
            id: item_id,
            from,
            to: status,
        },
        cascaded: Vec::new(),
        cascade_errors: Vec::new(),
    };

    if status == Status::Done {
        promote_parents(board, idx, &mut change);
    } else if status.reopens_parent() {
        reopen_parents(board, idx, &mut change);
    }
    Ok(change)
}

fn parent_index(board: &Board, idx: usize) -> Option<usize> {
    let parent = board.item(idx).parent_id.as_deref()?;
    board.index_of(parent).ok()
}

fn cascade_write(board: &mut Board, idx: usize, to: Status, change: &mut StatusChange) -> bool {
    let from = board.item(idx).status();
    board.item_mut(idx).progress.status = to;
    match board.save_progress(idx) {
        Ok(()) => {
            change.cascaded.push(Transition {
                id: board.item(idx).id.clone(),
                from,
                to,
            });
            true
        }
        Err(e) => {
            board.item_mut(idx).progress.status = from;
            let id = board.item(idx).id.clone();
            tracing::warn!(%id, error = %e, "status cascade step failed");
            change.cascade_errors.push(format!("{id}: {e}"));
            false
        }
    }
}

fn promote_parents(board: &mut Board, mut idx: usize, change: &mut StatusChange) {
    while let Some(parent) = parent_index(board, idx) {
        let parent_id = board.item(parent).id.clone();
        if board.item(parent).status().is_complete() {
            return;
        }
        let all_complete = board
            .children_of(&parent_id)
            .iter()
            .all(|c| c.status().is_complete());
        if !all_complete {
            return;
        }
        if !cascade_write(board, parent, Status::Done, change) {
            return;
        }
        idx = parent;
    }
}

fn reopen_parents(board: &mut Board, mut idx: usize, change: &mut StatusChange) {
    while let Some(parent) = parent_index(board, idx) {
        if !board.item(parent).status().is_complete() {
            return;
        }
        if !cascade_write(board, parent, Status::Development, change) {
            return;
        }
        idx = parent;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::write_item;
    use crate::deps::link;
    use tempfile::TempDir;

    const E: &str = "EPIC-260101-e00001";
    const S: &str = "STORY-260101-s00001";
    const A: &str = "TASK-260101-t00001";
    const B: &str = "TASK-260101-t00002";
    const C: &str = "TASK-260101-t00003";

    fn story_with_three_tasks() -> (TempDir, Board) {
        let dir = TempDir::new().unwrap();
        let e = write_item(dir.path(), E, "e", &[]);
        let s = write_item(&e, S, "s", &[]);
        for id in [A, B, C] {
            write_item(&s, id, "t", &[]);
        }
        let board = Board::load(dir.path()).unwrap();
        (dir, board)
    }

    fn status_on_disk(dir: &TempDir, id: &str) -> Status {
        Board::load(dir.path())
            .unwrap()
            .find_by_id(id)
            .unwrap()
            .status()
    }

    #[test]
    fn blocked_transition_lists_blockers() {
        let (_dir, mut board) = story_with_three_tasks();
        link(&mut board, B, A).unwrap();
        let err = set_status(&mut board, B, Status::Development).unwrap_err();
        match err {
            BoardError::Blocked { id, blockers } => {
                assert_eq!(id, B);
                assert_eq!(
                    blockers,
                    vec![ActiveBlocker {
                        id: A.into(),
                        status: "backlog".into()
                    }]
                );
            }
            other => panic!("unexpected: {other}"),
        }

        set_status(&mut board, A, Status::Done).unwrap();
        set_status(&mut board, B, Status::Development).unwrap();
        assert_eq!(board.find_by_id(B).unwrap().status(), Status::Development);
    }

    #[test]
    fn non_gated_statuses_ignore_blockers() {
        let (_dir, mut board) = story_with_three_tasks();
        link(&mut board, B, A).unwrap();
        set_status(&mut board, B, Status::Analysis).unwrap();
        set_status(&mut board, B, Status::Blocked).unwrap();
        set_status(&mut board, B, Status::Closed).unwrap();
    }

    #[test]
    fn finishing_last_child_promotes_story_and_epic() {
        let (dir, mut board) = story_with_three_tasks();
        set_status(&mut board, A, Status::Done).unwrap();
        set_status(&mut board, B, Status::Closed).unwrap();
        assert_eq!(board.find_by_id(S).unwrap().status(), Status::Backlog);

        let change = set_status(&mut board, C, Status::Done).unwrap();
        assert_eq!(
            change
                .cascaded
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>(),
            vec![S, E]
        );
        assert_eq!(status_on_disk(&dir, S), Status::Done);
        assert_eq!(status_on_disk(&dir, E), Status::Done);
    }

    #[test]
    fn reactivating_a_child_reopens_ancestors() {
        let (dir, mut board) = story_with_three_tasks();
        for id in [A, B, C] {
            set_status(&mut board, id, Status::Done).unwrap();
        }
        assert_eq!(status_on_disk(&dir, E), Status::Done);

        let change = set_status(&mut board, A, Status::Development).unwrap();
        assert_eq!(change.cascaded.len(), 2);
        assert_eq!(status_on_disk(&dir, S), Status::Development);
        assert_eq!(status_on_disk(&dir, E), Status::Development);
    }

    #[test]
    fn blocked_child_does_not_reopen_parent() {
        let (dir, mut board) = story_with_three_tasks();
        for id in [A, B, C] {
            set_status(&mut board, id, Status::Done).unwrap();
        }
        let change = set_status(&mut board, A, Status::Blocked).unwrap();
        assert!(change.cascaded.is_empty());
        assert_eq!(status_on_disk(&dir, S), Status::Done);
    }

    #[test]
    fn repeating_a_status_is_idempotent() {
        let (dir, mut board) = story_with_three_tasks();
        for id in [A, B, C] {
            set_status(&mut board, id, Status::Done).unwrap();
        }
        let before = Board::load(dir.path()).unwrap();
        let change = set_status(&mut board, C, Status::Done).unwrap();
        assert!(change.cascaded.is_empty());
        let after = Board::load(dir.path()).unwrap();
        for item in before.items() {
            let other = after.find_by_id(&item.id).unwrap();
            assert_eq!(item.progress, other.progress, "{}", item.id);
        }
    }

    #[test]
    fn repeating_done_finishes_an_interrupted_promotion() {
        let (dir, mut board) = story_with_three_tasks();
        set_status(&mut board, A, Status::Done).unwrap();
        set_status(&mut board, B, Status::Done).unwrap();
        // C reached done on disk but the cascade never ran.
        let c = board.index_of(C).unwrap();
        board.item_mut(c).progress.status = Status::Done;
        board.save_progress(c).unwrap();
        assert_eq!(status_on_disk(&dir, S), Status::Backlog);

        let change = set_status(&mut board, C, Status::Done).unwrap();
        assert_eq!(change.transition.from, Status::Done);
        assert_eq!(change.cascaded.len(), 2);
        assert_eq!(status_on_disk(&dir, S), Status::Done);
        assert_eq!(status_on_disk(&dir, E), Status::Done);
    }

    #[test]
    fn already_closed_parent_is_left_alone() {
        let (_dir, mut board) = story_with_three_tasks();
        set_status(&mut board, S, Status::Closed).unwrap();
        set_status(&mut board, A, Status::Done).unwrap();
        set_status(&mut board, B, Status::Done).unwrap();
        let change = set_status(&mut board, C, Status::Done).unwrap();
        assert!(change.cascaded.is_empty());
        assert_eq!(board.find_by_id(S).unwrap().status(), Status::Closed);
    }
}
