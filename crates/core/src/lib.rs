//! Core library for Gatehouse
//!
//! This crate contains the persistence layer the auth subsystem builds on:
//! - User accounts
//! - Opaque session tokens

pub mod error;
pub mod token;
pub mod user;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
