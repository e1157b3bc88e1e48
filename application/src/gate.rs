//! Access gate guarding the protected routes subtree.

use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse as _, Response},
    Extension,
};
use service::domain::route;
use tracing as log;

use crate::{api, Context};

/// Routes the gate relies on.
#[derive(Clone, Debug)]
pub struct Routes {
    /// Path of the login entry point.
    pub login: route::Path,

    /// Path to land on after signing in.
    pub landing: route::Path,

    /// Prefix of the subtree requiring a session.
    pub protected: route::Prefix,
}

/// Middleware letting only requests with a valid session into the
/// [`Routes::protected`] subtree.
///
/// Denied requests are redirected to [`Routes::login`] without a body.
/// Allowed requests reach the inner service with the [`Session`] in their
/// extensions, and get the refreshed session cookies (if any) attached to the
/// response.
///
/// [`Session`]: service::domain::Session
pub async fn enforce(
    Extension(routes): Extension<Arc<Routes>>,
    context: Context,
    mut request: Request,
    next: Next,
) -> Response {
    if !routes.protected.covers(request.uri().path()) {
        return next.run(request).await;
    }

    match context.current_session().await {
        Ok(session) => {
            drop(request.extensions_mut().insert(session));
            let response = next.run(request).await;
            (context.cookies(), response).into_response()
        }
        Err(e) => {
            if e.status_code.is_server_error() {
                log::error!("failed to authorize session: {e}");
            } else {
                log::debug!("denied `{}`: {e}", request.uri().path());
            }
            api::found(&routes.login)
        }
    }
}
