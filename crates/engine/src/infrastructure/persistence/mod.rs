//! Persistence: per-key locking and JSON file storage.

mod json_store;
mod keyed_lock;
mod story_repository;

pub use json_store::JsonFileStore;
pub use keyed_lock::KeyedLock;
pub use story_repository::FileStoryRepo;
