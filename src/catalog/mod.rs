pub mod filter;
pub mod model;
pub mod stats;
pub mod storage;
pub mod store;

pub use filter::{ShelfFilter, filter_books};
pub use model::{Book, BookDraft, BookPatch, Shelf};
pub use storage::{KeyValueStore, LocalFsKeyValueStore, MemoryKeyValueStore};
pub use store::{CatalogError, CatalogStore, MoveDirection};
