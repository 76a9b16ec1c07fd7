//! User accounts
//!
//! This module contains the user model and its storage.

mod file_store;
mod model;
mod repository;

pub use file_store::FileUserStore;
pub use model::*;
pub use repository::UserRepository;
