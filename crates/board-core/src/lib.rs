pub mod board;
pub mod codec;
pub mod config;
pub mod deps;
pub mod error;
pub mod id;
pub mod io;
pub mod item;
pub mod lifecycle;
pub mod paths;
pub mod plan_doc;
pub mod progress;
pub mod render;
pub mod scheduler;
pub mod search;
pub mod status;
pub mod system;
pub mod types;
pub mod validate;

pub use board::Board;
pub use error::{BoardError, Result};
pub use item::Item;
pub use types::{ItemType, Status};
