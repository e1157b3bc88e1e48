//! HTTP API definitions.

pub mod auth;
pub mod records;

use axum::{
    response::{IntoResponse as _, Response},
    routing::get,
    Router,
};
use service::domain::route;

use crate::gate;

/// Builds the [`Router`] of the HTTP API, without the gate and its
/// dependencies applied.
pub fn router(routes: &gate::Routes) -> Router {
    Router::new()
        .route("/auth/callback", get(auth::callback))
        .route("/auth/session", get(auth::session))
        .route("/logout", get(auth::logout))
        .route(&routes.protected.join("records"), get(records::read))
}

/// Responds with a `302 Found` redirect to the provided `location`.
#[must_use]
pub fn found(location: &route::Path) -> Response {
    (
        http::StatusCode::FOUND,
        [(http::header::LOCATION, location.to_string())],
    )
        .into_response()
}
