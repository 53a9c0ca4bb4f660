// todostore - Versioned local persistence for a to-do list

pub mod categories;
pub mod config;
pub mod filter;
pub mod kv;
pub mod list;
pub mod payload;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use categories::CategoryList;
pub use config::{Backend, Config};
pub use filter::{Filter, View};
pub use kv::{FileKv, KeyValueStore, MemoryKv, SqliteKv};
pub use list::TaskList;
pub use payload::{StoredPayload, StoredShape};
pub use store::{MigrationOutcome, TaskStore};
pub use task::{Task, TaskDraft, now_ms};
