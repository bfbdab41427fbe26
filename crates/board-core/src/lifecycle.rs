//! Creating, editing, deleting and moving items.

use crate::board::Board;
use crate::codec::{self, now_secs, Progress, Readme};
use crate::deps::{self, Edge};
use crate::error::{BoardError, Result};
use crate::id::{dir_name, generate_id, sanitize_slug};
use crate::io;
use crate::item::Item;
use crate::types::{ItemType, Status};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

const ID_ATTEMPTS: usize = 16;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    /// Defaults to `name` when absent.
    pub title: Option<String>,
    pub description: String,
    pub parent: Option<String>,
}

/// Check that `parent` is a legal parent for a new or moved item of `item_type`.
fn resolve_parent<'a>(
    board: &'a Board,
    item_type: ItemType,
    parent: Option<&str>,
) -> Result<Option<&'a Item>> {
    match (item_type.parent_type(), parent) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(BoardError::InvalidParent(
            "epics are top-level and take no parent".to_string(),
        )),
        (Some(expected), None) => Err(BoardError::InvalidParent(format!(
            "a {item_type} needs a parent {expected}"
        ))),
        (Some(expected), Some(pid)) => {
            let parent = board
                .get(pid)
                .ok_or_else(|| BoardError::InvalidParent(format!("parent {pid} not found")))?;
            if parent.item_type != expected {
                return Err(BoardError::InvalidParent(format!(
                    "a {item_type} belongs under a {expected}, but {} is a {}",
                    parent.id, parent.item_type
                )));
            }
            Ok(Some(parent))
        }
    }
}

pub fn create(board: &mut Board, item_type: ItemType, new: NewItem) -> Result<Item> {
    let slug = sanitize_slug(&new.name);
    if slug.is_empty() {
        return Err(BoardError::InvalidName(new.name));
    }
    let parent = resolve_parent(board, item_type, new.parent.as_deref())?;
    let parent_dir = parent.map_or_else(|| board.root().to_path_buf(), |p| p.path.clone());

    let mut id = generate_id(item_type);
    for _ in 0..ID_ATTEMPTS {
        if !board.contains(&id) {
            break;
        }
        id = generate_id(item_type);
    }
    if board.contains(&id) {
        return Err(BoardError::AlreadyExists(id));
    }

    let dir = parent_dir.join(dir_name(&id, &slug));
    if dir.exists() {
        return Err(BoardError::AlreadyExists(dir.display().to_string()));
    }

    let readme = Readme {
        title: new
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| new.name.trim().to_string()),
        description: new.description.trim().to_string(),
        ..Readme::default()
    };
    let mut progress = Progress {
        status: Status::Backlog,
        created_at: Some(now_secs()),
        ..Progress::default()
    };
    codec::write_readme(&dir, &readme)?;
    codec::write_progress(&dir, &mut progress)?;
    tracing::debug!(%id, path = %dir.display(), "created item");

    board.reload()?;
    Ok(board.find_by_id(&id)?.clone())
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ReadmeEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scope: Option<String>,
    pub acceptance_criteria: Option<String>,
}

pub fn edit_readme<'a>(board: &'a mut Board, id: &str, edit: ReadmeEdit) -> Result<&'a Item> {
    let idx = board.index_of(id)?;
    let readme = &mut board.item_mut(idx).readme;
    if let Some(t) = edit.title {
        readme.title = t.trim().to_string();
    }
    if let Some(d) = edit.description {
        readme.description = d.trim().to_string();
    }
    if let Some(s) = edit.scope {
        readme.scope = s.trim().to_string();
    }
    if let Some(a) = edit.acceptance_criteria {
        readme.acceptance_criteria = a.trim().to_string();
    }
    board.save_readme(idx)?;
    Ok(board.item(idx))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub removed: Vec<String>,
    /// Surviving items whose references were scrubbed.
    pub scrubbed: Vec<String>,
    /// Parent-level links that lost their justification.
    pub parent_links: Vec<Edge>,
}

/// Delete an item (and with `force`, its whole subtree), scrubbing every
/// reference to the removed IDs from the items that remain.
pub fn delete(board: &mut Board, id: &str, force: bool) -> Result<DeleteOutcome> {
    let item = board.find_by_id(id)?.clone();
    let descendants: Vec<String> = board
        .descendants_of(&item.id)
        .iter()
        .map(|d| d.id.clone())
        .collect();
    if !descendants.is_empty() && !force {
        return Err(BoardError::HasChildren(item.id));
    }

    let mut removed = vec![item.id.clone()];
    removed.extend(descendants);
    let gone: HashSet<&str> = removed.iter().map(String::as_str).collect();

    // Parent pairs of every edge crossing the deletion boundary.
    let mut parent_pairs: Vec<(String, String)> = Vec::new();
    let mut scrub: Vec<usize> = Vec::new();
    for (idx, other) in board.items().iter().enumerate() {
        if gone.contains(other.id.as_str()) {
            continue;
        }
        let mut touched = false;
        for r in other.blocked_by().iter().filter(|r| gone.contains(r.as_str())) {
            touched = true;
            if let (Some(pb), Some(pk)) = (&other.parent_id, board.get(r).and_then(|x| x.parent_id.clone())) {
                parent_pairs.push((pb.clone(), pk));
            }
        }
        for r in other.blocks().iter().filter(|r| gone.contains(r.as_str())) {
            touched = true;
            if let (Some(pb), Some(pk)) = (board.get(r).and_then(|x| x.parent_id.clone()), &other.parent_id) {
                parent_pairs.push((pb, pk.clone()));
            }
        }
        if touched {
            scrub.push(idx);
        }
    }

    let mut scrubbed = Vec::new();
    for idx in scrub {
        let progress = &mut board.item_mut(idx).progress;
        progress.blocked_by.retain(|r| !gone.contains(r.as_str()));
        progress.blocks.retain(|r| !gone.contains(r.as_str()));
        board.save_progress(idx)?;
        scrubbed.push(board.item(idx).id.clone());
    }

    io::remove_tree(&item.path)?;
    tracing::debug!(id = %item.id, removed = removed.len(), "deleted item");
    board.reload()?;

    let mut parent_links = Vec::new();
    for (pb, pk) in parent_pairs {
        deps::prune_between(board, &pb, &pk, &mut parent_links)?;
    }

    Ok(DeleteOutcome {
        removed,
        scrubbed,
        parent_links,
    })
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub id: String,
    pub from: Option<String>,
    pub to: String,
    pub path: PathBuf,
    pub parent_links_added: Vec<Edge>,
    pub parent_links_removed: Vec<Edge>,
}

/// Move a story under another epic, or a task/bug under another story.
/// Links of the moved item are escalated through its new ancestors and
/// links that only its old position justified are removed.
pub fn move_item(board: &mut Board, id: &str, to: &str) -> Result<MoveOutcome> {
    let item = board.find_by_id(id)?.clone();
    let new_parent = resolve_parent(board, item.item_type, Some(to))?
        .ok_or_else(|| BoardError::InvalidParent(format!("{} cannot be moved", item.id)))?
        .clone();

    let mut outcome = MoveOutcome {
        id: item.id.clone(),
        from: item.parent_id.clone(),
        to: new_parent.id.clone(),
        path: item.path.clone(),
        parent_links_added: Vec::new(),
        parent_links_removed: Vec::new(),
    };
    if item.parent_id.as_deref() == Some(new_parent.id.as_str()) {
        return Ok(outcome);
    }

    let parent_of = |x: &str| board.get(x).and_then(|i| i.parent_id.clone());
    let mut edges: Vec<(String, String)> = Vec::new();
    let mut old_pairs: Vec<(String, String)> = Vec::new();
    for blocker in item.blocked_by() {
        edges.push((item.id.clone(), blocker.clone()));
        if let (Some(pb), Some(pk)) = (item.parent_id.clone(), parent_of(blocker)) {
            old_pairs.push((pb, pk));
        }
    }
    for blocked in item.blocks() {
        edges.push((blocked.clone(), item.id.clone()));
        if let (Some(pb), Some(pk)) = (parent_of(blocked), item.parent_id.clone()) {
            old_pairs.push((pb, pk));
        }
    }

    let target = new_parent.path.join(item.dir_name());
    io::move_dir(&item.path, &target)?;
    tracing::debug!(id = %item.id, to = %new_parent.id, "moved item");
    board.reload()?;
    outcome.path = target;

    for (blocked, blocker) in &edges {
        let (Ok(b), Ok(k)) = (board.index_of(blocked), board.index_of(blocker)) else {
            continue;
        };
        deps::escalate(board, b, k, &mut outcome.parent_links_added)?;
    }
    for (pb, pk) in old_pairs {
        deps::prune_between(board, &pb, &pk, &mut outcome.parent_links_removed)?;
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::link;
    use tempfile::TempDir;

    fn empty_board() -> (TempDir, Board) {
        let dir = TempDir::new().unwrap();
        let board = Board::load(dir.path()).unwrap();
        (dir, board)
    }

    fn mk(board: &mut Board, t: ItemType, name: &str, parent: Option<&str>) -> String {
        create(
            board,
            t,
            NewItem {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                ..NewItem::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_writes_templated_files() {
        let (dir, mut board) = empty_board();
        let epic = create(
            &mut board,
            ItemType::Epic,
            NewItem {
                name: "User Auth".into(),
                title: Some("User authentication".into()),
                description: "Let people sign in.".into(),
                parent: None,
            },
        )
        .unwrap();
        assert_eq!(epic.name, "user-auth");
        assert!(epic.path.starts_with(dir.path()));
        assert!(epic.path.join("README.md").exists());
        assert!(epic.path.join("progress.md").exists());
        assert_eq!(epic.readme.title, "User authentication");
        assert_eq!(epic.readme.description, "Let people sign in.");
        assert_eq!(epic.status(), Status::Backlog);
        assert!(epic.progress.created_at.is_some());
        assert!(epic.id.starts_with("EPIC-"));
    }

    #[test]
    fn create_enforces_parent_types() {
        let (_dir, mut board) = empty_board();
        let epic = mk(&mut board, ItemType::Epic, "e", None);
        let story = mk(&mut board, ItemType::Story, "s", Some(&epic));

        let bad = [
            (ItemType::Epic, Some(epic.as_str())),
            (ItemType::Story, None),
            (ItemType::Story, Some(story.as_str())),
            (ItemType::Task, Some(epic.as_str())),
            (ItemType::Bug, Some("STORY-260101-zzzzzz")),
        ];
        for (t, parent) in bad {
            let err = create(
                &mut board,
                t,
                NewItem {
                    name: "x".into(),
                    parent: parent.map(str::to_string),
                    ..NewItem::default()
                },
            )
            .unwrap_err();
            assert!(matches!(err, BoardError::InvalidParent(_)), "{t} {parent:?}");
        }
        let bug = mk(&mut board, ItemType::Bug, "crash", Some(&story));
        assert_eq!(
            board.find_by_id(&bug).unwrap().parent_id.as_deref(),
            Some(story.as_str())
        );
    }

    #[test]
    fn create_rejects_unsluggable_names() {
        let (_dir, mut board) = empty_board();
        let err = create(
            &mut board,
            ItemType::Epic,
            NewItem {
                name: "!!!".into(),
                ..NewItem::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::InvalidName(_)));
    }

    #[test]
    fn delete_refuses_parents_without_force() {
        let (_dir, mut board) = empty_board();
        let epic = mk(&mut board, ItemType::Epic, "e", None);
        mk(&mut board, ItemType::Story, "s", Some(&epic));
        assert!(matches!(
            delete(&mut board, &epic, false),
            Err(BoardError::HasChildren(_))
        ));
        let out = delete(&mut board, &epic, true).unwrap();
        assert_eq!(out.removed.len(), 2);
        assert!(board.is_empty());
    }

    #[test]
    fn delete_scrubs_references_and_deescalates() {
        let (dir, mut board) = empty_board();
        let e1 = mk(&mut board, ItemType::Epic, "e1", None);
        let e2 = mk(&mut board, ItemType::Epic, "e2", None);
        let s1 = mk(&mut board, ItemType::Story, "s1", Some(&e1));
        let s2 = mk(&mut board, ItemType::Story, "s2", Some(&e2));
        let t1 = mk(&mut board, ItemType::Task, "t1", Some(&s1));
        let t2 = mk(&mut board, ItemType::Task, "t2", Some(&s2));
        link(&mut board, &t2, &t1).unwrap();
        assert_eq!(board.find_by_id(&e2).unwrap().blocked_by(), &[e1.clone()]);

        let out = delete(&mut board, &t1, false).unwrap();
        assert_eq!(out.scrubbed, vec![t2.clone()]);
        assert_eq!(out.parent_links.len(), 2);

        let reloaded = Board::load(dir.path()).unwrap();
        for id in [&t2, &s1, &s2, &e1, &e2] {
            let item = reloaded.find_by_id(id).unwrap();
            assert!(item.blocked_by().is_empty(), "{id}");
            assert!(item.blocks().is_empty(), "{id}");
        }
    }

    #[test]
    fn move_reescalates_links() {
        let (dir, mut board) = empty_board();
        let e1 = mk(&mut board, ItemType::Epic, "e1", None);
        let e2 = mk(&mut board, ItemType::Epic, "e2", None);
        let s1 = mk(&mut board, ItemType::Story, "s1", Some(&e1));
        let s2 = mk(&mut board, ItemType::Story, "s2", Some(&e1));
        let s3 = mk(&mut board, ItemType::Story, "s3", Some(&e2));
        let t1 = mk(&mut board, ItemType::Task, "t1", Some(&s1));
        let t2 = mk(&mut board, ItemType::Task, "t2", Some(&s2));
        link(&mut board, &t2, &t1).unwrap();
        assert_eq!(board.find_by_id(&s2).unwrap().blocked_by(), &[s1.clone()]);

        // Move the blocked task into another epic's story.
        let out = move_item(&mut board, &t2, &s3).unwrap();
        assert!(out.path.starts_with(board.find_by_id(&s3).unwrap().path.clone()));

        let reloaded = Board::load(dir.path()).unwrap();
        assert_eq!(reloaded.find_by_id(&t2).unwrap().parent_id.as_deref(), Some(s3.as_str()));
        assert!(reloaded.find_by_id(&s2).unwrap().blocked_by().is_empty());
        assert_eq!(reloaded.find_by_id(&s3).unwrap().blocked_by(), &[s1.clone()]);
        assert_eq!(reloaded.find_by_id(&e2).unwrap().blocked_by(), &[e1.clone()]);
    }

    #[test]
    fn move_checks_target_type() {
        let (_dir, mut board) = empty_board();
        let e1 = mk(&mut board, ItemType::Epic, "e1", None);
        let e2 = mk(&mut board, ItemType::Epic, "e2", None);
        let s1 = mk(&mut board, ItemType::Story, "s1", Some(&e1));
        assert!(matches!(
            move_item(&mut board, &e1, &e2),
            Err(BoardError::InvalidParent(_))
        ));
        assert!(matches!(
            move_item(&mut board, &s1, &s1),
            Err(BoardError::InvalidParent(_))
        ));
        move_item(&mut board, &s1, &e2).unwrap();
        assert_eq!(board.children_of(&e2).len(), 1);
    }

    #[test]
    fn edit_readme_updates_only_given_fields() {
        let (dir, mut board) = empty_board();
        let e = mk(&mut board, ItemType::Epic, "e", None);
        edit_readme(
            &mut board,
            &e,
            ReadmeEdit {
                scope: Some("Backend only".into()),
                ..ReadmeEdit::default()
            },
        )
        .unwrap();
        let reloaded = Board::load(dir.path()).unwrap();
        let item = reloaded.find_by_id(&e).unwrap();
        assert_eq!(item.readme.scope, "Backend only");
        assert_eq!(item.readme.title, "e");
    }
}
