use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ItemType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Epic,
    Story,
    Task,
    Bug,
}

impl ItemType {
    pub fn all() -> &'static [ItemType] {
        &[ItemType::Epic, ItemType::Story, ItemType::Task, ItemType::Bug]
    }

    /// Upper-case prefix used in IDs and directory names.
    pub fn prefix(self) -> &'static str {
        match self {
            ItemType::Epic => "EPIC",
            ItemType::Story => "STORY",
            ItemType::Task => "TASK",
            ItemType::Bug => "BUG",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Epic => "epic",
            ItemType::Story => "story",
            ItemType::Task => "task",
            ItemType::Bug => "bug",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<ItemType> {
        match prefix.to_ascii_uppercase().as_str() {
            "EPIC" => Some(ItemType::Epic),
            "STORY" => Some(ItemType::Story),
            "TASK" => Some(ItemType::Task),
            "BUG" => Some(ItemType::Bug),
            _ => None,
        }
    }

    /// The only type an item of this type may live under. `None` for epics.
    pub fn parent_type(self) -> Option<ItemType> {
        match self {
            ItemType::Epic => None,
            ItemType::Story => Some(ItemType::Epic),
            ItemType::Task | ItemType::Bug => Some(ItemType::Story),
        }
    }

    /// Depth in the hierarchy, epics at 0.
    pub fn depth(self) -> usize {
        match self {
            ItemType::Epic => 0,
            ItemType::Story => 1,
            ItemType::Task | ItemType::Bug => 2,
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, ItemType::Task | ItemType::Bug)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::from_prefix(s.trim()).ok_or_else(|| BoardError::InvalidType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Backlog,
    Analysis,
    ToDev,
    Development,
    ToReview,
    Reviewing,
    Done,
    Closed,
    Blocked,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::Backlog,
            Status::Analysis,
            Status::ToDev,
            Status::Development,
            Status::ToReview,
            Status::Reviewing,
            Status::Done,
            Status::Closed,
            Status::Blocked,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Analysis => "analysis",
            Status::ToDev => "to-dev",
            Status::Development => "development",
            Status::ToReview => "to-review",
            Status::Reviewing => "reviewing",
            Status::Done => "done",
            Status::Closed => "closed",
            Status::Blocked => "blocked",
        }
    }

    /// Done or closed: the item no longer blocks anything.
    pub fn is_complete(self) -> bool {
        matches!(self, Status::Done | Status::Closed)
    }

    /// Statuses that may only be entered once every blocker is complete.
    pub fn requires_unblocked(self) -> bool {
        matches!(
            self,
            Status::Development | Status::ToReview | Status::Reviewing | Status::Done
        )
    }

    /// Statuses that reopen a completed parent.
    pub fn reopens_parent(self) -> bool {
        !matches!(self, Status::Done | Status::Closed | Status::Blocked)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backlog" | "open" => Ok(Status::Backlog),
            "analysis" => Ok(Status::Analysis),
            "to-dev" => Ok(Status::ToDev),
            "development" | "dev" => Ok(Status::Development),
            "to-review" => Ok(Status::ToReview),
            "reviewing" | "review" => Ok(Status::Reviewing),
            "done" => Ok(Status::Done),
            "closed" => Ok(Status::Closed),
            "blocked" => Ok(Status::Blocked),
            _ => Err(BoardError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display() {
        for &s in Status::all() {
            let parsed: Status = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn status_aliases() {
        assert_eq!("dev".parse::<Status>().unwrap(), Status::Development);
        assert_eq!("review".parse::<Status>().unwrap(), Status::Reviewing);
        assert_eq!("open".parse::<Status>().unwrap(), Status::Backlog);
        assert_eq!(" DONE ".parse::<Status>().unwrap(), Status::Done);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(matches!(
            "shipped".parse::<Status>(),
            Err(BoardError::InvalidStatus(_))
        ));
    }

    #[test]
    fn parent_types_follow_fixed_hierarchy() {
        assert_eq!(ItemType::Epic.parent_type(), None);
        assert_eq!(ItemType::Story.parent_type(), Some(ItemType::Epic));
        assert_eq!(ItemType::Task.parent_type(), Some(ItemType::Story));
        assert_eq!(ItemType::Bug.parent_type(), Some(ItemType::Story));
    }

    #[test]
    fn item_type_parses_case_insensitively() {
        assert_eq!("Story".parse::<ItemType>().unwrap(), ItemType::Story);
        assert_eq!("BUG".parse::<ItemType>().unwrap(), ItemType::Bug);
        assert!("feature".parse::<ItemType>().is_err());
    }

    #[test]
    fn blocking_preconditions() {
        assert!(Status::Development.requires_unblocked());
        assert!(Status::Done.requires_unblocked());
        assert!(!Status::Analysis.requires_unblocked());
        assert!(!Status::Closed.requires_unblocked());
        assert!(Status::Backlog.reopens_parent());
        assert!(!Status::Blocked.reopens_parent());
    }
}
