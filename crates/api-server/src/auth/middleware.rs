//! Authorization middleware
//!
//! Classifies every inbound request against an immutable route table and
//! gates secured routes on a valid session bearer naming an existing user.
//! The resolved user rides in the request extensions for downstream
//! handlers; nothing outlives the request.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use gatehouse_core::user::{User, UserRepository};

use super::claims::SessionClaims;
use super::errors::AuthError;
use crate::state::AppState;

/// The authenticated user for the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Allowed only outside production
    Maintenance,
    /// Passes through unauthenticated
    Public,
    /// Requires a valid session bearer
    Secured,
}

/// Immutable route classification table, assembled once at boot
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    maintenance: HashSet<String>,
    get_allowed: HashSet<String>,
    post_allowed: HashSet<String>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    pub fn classify(&self, method: &Method, path: &str) -> RouteClass {
        // Cross-origin preflight is always allowed
        if method == Method::OPTIONS {
            return RouteClass::Public;
        }
        if self.maintenance.contains(path) {
            return RouteClass::Maintenance;
        }
        let allowed = if method == Method::GET {
            self.get_allowed.contains(path)
        } else if method == Method::POST {
            self.post_allowed.contains(path)
        } else {
            false
        };
        if allowed {
            RouteClass::Public
        } else {
            RouteClass::Secured
        }
    }
}

#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    table: RouteTable,
}

impl RouteTableBuilder {
    pub fn allow_get(mut self, path: impl Into<String>) -> Self {
        self.table.get_allowed.insert(path.into());
        self
    }

    pub fn allow_post(mut self, path: impl Into<String>) -> Self {
        self.table.post_allowed.insert(path.into());
        self
    }

    pub fn maintenance(mut self, path: impl Into<String>) -> Self {
        self.table.maintenance.insert(path.into());
        self
    }

    pub fn build(self) -> RouteTable {
        self.table
    }
}

/// Middleware entry point, evaluated on every request
pub async fn authorize(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.routes().classify(req.method(), req.uri().path()) {
        RouteClass::Public => next.run(req).await,
        RouteClass::Maintenance => {
            if state.config().environment.is_production() {
                AuthError::NotAuthorized.into_response()
            } else {
                next.run(req).await
            }
        }
        RouteClass::Secured => match authenticate(&state, req.headers()).await {
            Ok(user) => {
                req.extensions_mut().insert(CurrentUser(user));
                next.run(req).await
            }
            Err(err) => err.into_response(),
        },
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AuthError> {
    let bearer = bearer_token(headers).ok_or(AuthError::NotAuthorized)?;
    let claims: SessionClaims = state
        .signer()
        .verify(bearer)
        .map_err(|_| AuthError::NotAuthorized)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::NotAuthorized)?;

    state
        .users()
        .get(user_id)
        .await
        .map_err(|err| AuthError::Storage(err.to_string()))?
        .ok_or(AuthError::NotAuthorized)
}

/// Extract the bearer value from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::builder()
            .allow_get("/auth")
            .allow_get("/server/image")
            .allow_post("/auth")
            .maintenance("/install")
            .build()
    }

    #[test]
    fn options_is_always_public() {
        let table = table();
        assert_eq!(
            table.classify(&Method::OPTIONS, "/anything/at/all"),
            RouteClass::Public
        );
    }

    #[test]
    fn allow_lists_are_method_specific() {
        let table = table();
        assert_eq!(table.classify(&Method::GET, "/auth"), RouteClass::Public);
        assert_eq!(table.classify(&Method::POST, "/auth"), RouteClass::Public);
        assert_eq!(
            table.classify(&Method::GET, "/server/image"),
            RouteClass::Public
        );
        // POST to a GET-only path is secured
        assert_eq!(
            table.classify(&Method::POST, "/server/image"),
            RouteClass::Secured
        );
    }

    #[test]
    fn unknown_paths_are_secured() {
        let table = table();
        assert_eq!(
            table.classify(&Method::GET, "/users/me"),
            RouteClass::Secured
        );
        assert_eq!(
            table.classify(&Method::DELETE, "/auth"),
            RouteClass::Secured
        );
    }

    #[test]
    fn maintenance_paths_classify_as_maintenance() {
        let table = table();
        assert_eq!(
            table.classify(&Method::POST, "/install"),
            RouteClass::Maintenance
        );
    }

    #[test]
    fn bearer_extraction_requires_the_scheme() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
