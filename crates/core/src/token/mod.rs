//! Opaque session tokens
//!
//! Revocable session credentials, stored server-side only as a one-way hash.

mod file_store;
mod model;
mod repository;

pub use file_store::FileTokenStore;
pub use model::*;
pub use repository::TokenRepository;
