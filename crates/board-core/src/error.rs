use thiserror::Error;

/// An item listed in `blocked_by` whose status is neither done nor closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBlocker {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board not initialized: run 'board init'")]
    NotInitialized,

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("invalid id '{0}': expected TYPE-YYMMDD-xxxxxx")]
    InvalidId(String),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),

    #[error("invalid item type '{0}': expected epic, story, task or bug")]
    InvalidType(String),

    #[error("invalid parent: {0}")]
    InvalidParent(String),

    #[error("{blocked} is not blocked by {blocker}")]
    LinkNotFound { blocked: String, blocker: String },

    #[error("an item cannot block itself: {0}")]
    SelfLink(String),

    #[error("{id} is blocked by: {}", format_blockers(.blockers))]
    Blocked {
        id: String,
        blockers: Vec<ActiveBlocker>,
    },

    #[error("{0} has children; use --force to delete the whole subtree")]
    HasChildren(String),

    #[error("dependency cycle detected among: {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    #[error("duplicate item id {id} at {first} and {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("graphviz renderer '{0}' not found on PATH")]
    RendererMissing(String),

    #[error("graphviz render failed: {0}")]
    RenderFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

fn format_blockers(blockers: &[ActiveBlocker]) -> String {
    blockers
        .iter()
        .map(|b| format!("{} ({})", b.id, b.status))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, BoardError>;
