//! Repository layer for database access

pub mod users;

// Re-exports
pub use users::{UserRepository, UserStore};
