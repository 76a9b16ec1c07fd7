//! Current-user endpoint

use axum::{routing::get, Extension, Json, Router};

use crate::auth::{CurrentUser, PublicUser};
use crate::state::AppState;

/// The middleware resolved the user; hand back the display-safe view.
async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users/me", get(me))
}
