//! Storage backends for the student answers record.

pub mod file_backend;
pub mod in_memory;
pub mod store;
pub mod upstash;

pub use file_backend::FileBackend;
pub use in_memory::InMemoryBackend;
pub use store::{ContextStore, SaveError, select_backend};
pub use upstash::UpstashBackend;
