//! In-memory snapshot of a board directory.
//!
//! The loader walks exactly three levels (epics, stories, tasks/bugs),
//! enforcing the parent type at each level. Directories whose names do not
//! parse as items are user content and are skipped silently; item
//! directories found at the wrong depth are remembered as strays so the
//! validator can report them.

use crate::codec;
use crate::error::{BoardError, Result};
use crate::id::{canonical_id, parse_dir_name};
use crate::item::Item;
use crate::types::ItemType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Board {
    root: PathBuf,
    items: Vec<Item>,
    index: HashMap<String, usize>,
    strays: Vec<PathBuf>,
}

impl Board {
    // ---------------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(BoardError::NotInitialized);
        }
        let mut board = Board {
            root: root.to_path_buf(),
            items: Vec::new(),
            index: HashMap::new(),
            strays: Vec::new(),
        };
        board.walk(root, None, 0)?;
        Ok(board)
    }

    /// Re-read everything from disk, replacing the snapshot.
    pub fn reload(&mut self) -> Result<()> {
        *self = Board::load(&self.root)?;
        Ok(())
    }

    fn walk(&mut self, dir: &Path, parent: Option<&str>, depth: usize) -> Result<()> {
        let mut found: Vec<Item> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Ok(parsed) = parse_dir_name(&file_name) else {
                continue;
            };
            if parsed.id.item_type.depth() != depth {
                tracing::warn!(path = %entry.path().display(), "item directory at wrong depth, skipped");
                self.strays.push(entry.path());
                continue;
            }
            let path = entry.path();
            found.push(Item {
                id: parsed.id.id,
                item_type: parsed.id.item_type,
                name: parsed.slug,
                readme: codec::read_readme(&path)?,
                progress: codec::read_progress(&path)?,
                path,
                parent_id: parent.map(str::to_string),
                legacy_id: parsed.id.legacy,
            });
        }
        found.sort_by(|a, b| {
            a.progress
                .created_at
                .cmp(&b.progress.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        for item in found {
            if let Some(&existing) = self.index.get(&item.id) {
                return Err(BoardError::DuplicateId {
                    id: item.id.clone(),
                    first: self.items[existing].path.display().to_string(),
                    second: item.path.display().to_string(),
                });
            }
            let id = item.id.clone();
            let path = item.path.clone();
            self.index.insert(id.clone(), self.items.len());
            self.items.push(item);
            if depth < 2 {
                self.walk(&path, Some(&id), depth + 1)?;
            } else {
                self.collect_strays(&path)?;
            }
        }
        Ok(())
    }

    fn collect_strays(&mut self, dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && parse_dir_name(&entry.file_name().to_string_lossy()).is_ok()
            {
                self.strays.push(entry.path());
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item-like directories found below the task level or at the wrong depth.
    pub fn strays(&self) -> &[PathBuf] {
        &self.strays
    }

    /// Case-insensitive lookup.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(&canonical_id(id)).map(|&i| &self.items[i])
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Item> {
        self.get(id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&canonical_id(id))
    }

    pub fn find_by_type(&self, item_type: ItemType) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.item_type == item_type)
            .collect()
    }

    pub fn children_of(&self, id: &str) -> Vec<&Item> {
        let id = canonical_id(id);
        self.items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(id.as_str()))
            .collect()
    }

    pub fn parent_of(&self, item: &Item) -> Option<&Item> {
        item.parent_id.as_deref().and_then(|p| self.get(p))
    }

    /// IDs from the root epic down to `id` inclusive.
    pub fn ancestry(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cur = self.get(id);
        while let Some(item) = cur {
            chain.push(item.id.clone());
            cur = self.parent_of(item);
        }
        chain.reverse();
        chain
    }

    /// True when `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: &str, id: &str) -> bool {
        let ancestor = canonical_id(ancestor);
        self.ancestry(id).contains(&ancestor)
    }

    /// Every item below `id`, depth first, in load order.
    pub fn descendants_of(&self, id: &str) -> Vec<&Item> {
        let mut out = Vec::new();
        for child in self.children_of(id) {
            out.push(child);
            out.extend(self.descendants_of(&child.id));
        }
        out
    }

    /// True iff some child of `blocked_parent` lists some child of
    /// `blocker_parent` in its `blocked_by`.
    pub fn has_cross_child_dependency(&self, blocked_parent: &str, blocker_parent: &str) -> bool {
        let blocker_children: Vec<&str> = self
            .children_of(blocker_parent)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        self.children_of(blocked_parent).iter().any(|child| {
            child
                .blocked_by()
                .iter()
                .any(|b| blocker_children.contains(&b.as_str()))
        })
    }

    // ---------------------------------------------------------------------------
    // Mutation helpers (crate-internal)
    // ---------------------------------------------------------------------------

    pub(crate) fn index_of(&self, id: &str) -> Result<usize> {
        self.index
            .get(&canonical_id(id))
            .copied()
            .ok_or_else(|| BoardError::NotFound(id.to_string()))
    }

    pub(crate) fn item(&self, idx: usize) -> &Item {
        &self.items[idx]
    }

    pub(crate) fn item_mut(&mut self, idx: usize) -> &mut Item {
        &mut self.items[idx]
    }

    /// Persist an item's `progress.md`, refreshing `last_update`.
    pub(crate) fn save_progress(&mut self, idx: usize) -> Result<()> {
        let item = &mut self.items[idx];
        tracing::debug!(id = %item.id, "writing progress");
        codec::write_progress(&item.path, &mut item.progress)
    }

    pub(crate) fn save_readme(&self, idx: usize) -> Result<()> {
        let item = &self.items[idx];
        codec::write_readme(&item.path, &item.readme)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
