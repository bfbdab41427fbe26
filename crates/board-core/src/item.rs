use crate::codec::{Progress, Readme};
use crate::types::{ItemType, Status};
use serde::Serialize;
use std::path::PathBuf;

/// One epic, story, task or bug as materialized from its directory.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: String,
    pub item_type: ItemType,
    /// Slug part of the directory name.
    pub name: String,
    pub path: PathBuf,
    /// `None` for epics.
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub legacy_id: bool,
    pub readme: Readme,
    pub progress: Progress,
}

impl Item {
    pub fn title(&self) -> &str {
        if self.readme.title.is_empty() {
            &self.name
        } else {
            &self.readme.title
        }
    }

    pub fn status(&self) -> Status {
        self.progress.status
    }

    pub fn blocked_by(&self) -> &[String] {
        &self.progress.blocked_by
    }

    pub fn blocks(&self) -> &[String] {
        &self.progress.blocks
    }

    pub fn dir_name(&self) -> String {
        crate::id::dir_name(&self.id, &self.name)
    }
}
