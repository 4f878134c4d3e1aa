//! Threaded comments shared by tasks (flat) and discussion posts (nested).

pub mod guard;
pub mod memory;
pub mod service;
pub mod sqlite;
pub mod store;
pub mod tree;

pub use guard::{Actor, DeletePolicy};
pub use memory::MemoryCommentStore;
pub use service::CommentService;
pub use sqlite::SqliteCommentStore;
pub use store::CommentStore;
pub use tree::{CommentTree, ThreadNode, Threaded, MAX_THREAD_DEPTH};
