//! Authentication and session authorization

pub mod claims;
pub mod errors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod signer;

pub use errors::AuthError;
pub use middleware::{CurrentUser, RouteTable};
pub use service::{AuthService, PublicUser, Session};
pub use signer::TokenSigner;
