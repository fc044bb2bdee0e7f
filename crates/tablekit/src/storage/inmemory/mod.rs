//! In-memory storage backend.

mod error;
mod store;

pub use error::InMemoryError;
pub use store::InMemoryStore;
