//! Dependency links between items.
//!
//! Every edge is stored twice: `blocker` in the blocked item's `blocked_by`
//! and `blocked` in the blocker's `blocks`. A link between items under
//! different parents is escalated: the parents get the same link, and so on
//! up the tree while the ancestors differ. Unlinking walks the same path
//! and drops a parent-level link only once no pair of children justifies it.
//!
//! All steps mutate one in-memory [`Board`] and write each touched
//! `progress.md` immediately (blocked side first), so the cross-child
//! predicate always sees the state just written.

use crate::board::Board;
use crate::error::{BoardError, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub blocked: String,
    pub blocker: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkOutcome {
    /// False when `link` finds the direct link already present. `unlink` always changes.
    pub changed: bool,
    /// Ancestor-level links added (link) or removed (unlink), child-most first.
    pub parent_links: Vec<Edge>,
}

// ---------------------------------------------------------------------------
// Public operations
// ---------------------------------------------------------------------------

/// Record that `blocked` cannot proceed until `blocker` is finished.
pub fn link(board: &mut Board, blocked: &str, blocker: &str) -> Result<LinkOutcome> {
    let b = board.index_of(blocked)?;
    let k = board.index_of(blocker)?;
    if b == k {
        return Err(BoardError::SelfLink(board.item(b).id.clone()));
    }

    let blocker_id = board.item(k).id.clone();
    if board.item(b).progress.is_blocked_by(&blocker_id) {
        return Ok(LinkOutcome::default());
    }

    insert_edge(board, b, k)?;
    tracing::debug!(blocked = %board.item(b).id, blocker = %blocker_id, "linked");

    let mut outcome = LinkOutcome {
        changed: true,
        parent_links: Vec::new(),
    };
    escalate(board, b, k, &mut outcome.parent_links)?;
    Ok(outcome)
}

/// Remove the link `blocked` ← `blocker` and any parent-level links it alone justified.
pub fn unlink(board: &mut Board, blocked: &str, blocker: &str) -> Result<LinkOutcome> {
    let b = board.index_of(blocked)?;
    let k = board.index_of(blocker)?;
    let blocker_id = board.item(k).id.clone();
    if !board.item(b).progress.is_blocked_by(&blocker_id) {
        return Err(BoardError::LinkNotFound {
            blocked: board.item(b).id.clone(),
            blocker: blocker_id,
        });
    }

    remove_edge(board, b, k)?;
    tracing::debug!(blocked = %board.item(b).id, blocker = %blocker_id, "unlinked");

    let mut outcome = LinkOutcome {
        changed: true,
        parent_links: Vec::new(),
    };
    deescalate(board, b, k, &mut outcome.parent_links)?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

/// Parents of the two items, when both exist, differ, and neither contains the other.
///
/// A nested pair stops the recursion even though the parents differ. Linking a task
/// to a story of its own epic would otherwise escalate to "story blocked by its own
/// epic", a parent waiting on its ancestor that can never finish first.
fn diverging_parents(board: &Board, b: usize, k: usize) -> Result<Option<(usize, usize)>> {
    let (Some(pb), Some(pk)) = (
        board.item(b).parent_id.clone(),
        board.item(k).parent_id.clone(),
    ) else {
        return Ok(None);
    };
    if pb == pk || board.is_ancestor_or_self(&pb, &pk) || board.is_ancestor_or_self(&pk, &pb) {
        return Ok(None);
    }
    Ok(Some((board.index_of(&pb)?, board.index_of(&pk)?)))
}

pub(crate) fn escalate(board: &mut Board, b: usize, k: usize, added: &mut Vec<Edge>) -> Result<()> {
    let Some((pb, pk)) = diverging_parents(board, b, k)? else {
        return Ok(());
    };
    if insert_edge(board, pb, pk)? {
        let edge = edge(board, pb, pk);
        tracing::debug!(blocked = %edge.blocked, blocker = %edge.blocker, "escalated link");
        added.push(edge);
    }
    escalate(board, pb, pk, added)
}

pub(crate) fn deescalate(
    board: &mut Board,
    b: usize,
    k: usize,
    removed: &mut Vec<Edge>,
) -> Result<()> {
    let Some((pb, pk)) = diverging_parents(board, b, k)? else {
        return Ok(());
    };
    deescalate_parents(board, pb, pk, removed)
}

/// Re-check a parent-level link whose child edge disappeared through delete
/// or move. Missing or nested parents are left alone.
pub(crate) fn prune_between(
    board: &mut Board,
    blocked_parent: &str,
    blocker_parent: &str,
    removed: &mut Vec<Edge>,
) -> Result<()> {
    let (Ok(pb), Ok(pk)) = (board.index_of(blocked_parent), board.index_of(blocker_parent)) else {
        return Ok(());
    };
    let (pb_id, pk_id) = (board.item(pb).id.clone(), board.item(pk).id.clone());
    if pb == pk || board.is_ancestor_or_self(&pb_id, &pk_id) || board.is_ancestor_or_self(&pk_id, &pb_id) {
        return Ok(());
    }
    deescalate_parents(board, pb, pk, removed)
}

/// Drop the `pb` ← `pk` link unless a child pair still justifies it, then
/// continue with their parents.
pub(crate) fn deescalate_parents(
    board: &mut Board,
    pb: usize,
    pk: usize,
    removed: &mut Vec<Edge>,
) -> Result<()> {
    let (pb_id, pk_id) = (board.item(pb).id.clone(), board.item(pk).id.clone());
    if board.has_cross_child_dependency(&pb_id, &pk_id) {
        tracing::debug!(blocked = %pb_id, blocker = %pk_id, "parent link still justified");
        return Ok(());
    }
    if remove_edge(board, pb, pk)? {
        tracing::debug!(blocked = %pb_id, blocker = %pk_id, "de-escalated link");
        removed.push(Edge {
            blocked: pb_id,
            blocker: pk_id,
        });
    }
    deescalate(board, pb, pk, removed)
}

// ---------------------------------------------------------------------------
// Edge storage
// ---------------------------------------------------------------------------

fn edge(board: &Board, b: usize, k: usize) -> Edge {
    Edge {
        blocked: board.item(b).id.clone(),
        blocker: board.item(k).id.clone(),
    }
}

/// Idempotent insert on both sides. Returns true if either file changed.
pub(crate) fn insert_edge(board: &mut Board, b: usize, k: usize) -> Result<bool> {
    let blocked_id = board.item(b).id.clone();
    let blocker_id = board.item(k).id.clone();
    let mut changed = false;

    if !board.item(b).progress.is_blocked_by(&blocker_id) {
        board.item_mut(b).progress.blocked_by.push(blocker_id);
        board.save_progress(b)?;
        changed = true;
    }
    if !board.item(k).progress.blocks(&blocked_id) {
        board.item_mut(k).progress.blocks.push(blocked_id);
        board.save_progress(k)?;
        changed = true;
    }
    Ok(changed)
}

/// Remove on both sides. Returns true if either file changed.
pub(crate) fn remove_edge(board: &mut Board, b: usize, k: usize) -> Result<bool> {
    let blocked_id = board.item(b).id.clone();
    let blocker_id = board.item(k).id.clone();
    let mut changed = false;

    if board.item(b).progress.is_blocked_by(&blocker_id) {
        board
            .item_mut(b)
            .progress
            .blocked_by
            .retain(|id| *id != blocker_id);
        board.save_progress(b)?;
        changed = true;
    }
    if board.item(k).progress.blocks(&blocked_id) {
        board.item_mut(k).progress.blocks.retain(|id| *id != blocked_id);
        board.save_progress(k)?;
        changed = true;
    }
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
