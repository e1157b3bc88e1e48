//! Session-related HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::Query,
    response::{IntoResponse as _, Response},
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{
        identity::session::{self, AuthCode, Grant},
        route, Session,
    },
};
use tracing as log;

use crate::{api, gate, Context};

/// Query parameters of the identity provider redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code to exchange.
    pub code: Option<String>,

    /// Same-origin path to continue to.
    pub next: Option<String>,
}

/// Exchanges the authorization code of the identity provider redirect for a
/// session, and continues to the `next` path.
///
/// Any failure leads to the login path, leaving cookies intact.
pub async fn callback(
    Extension(routes): Extension<Arc<gate::Routes>>,
    context: Context,
    params: Option<Query<CallbackParams>>,
) -> Response {
    let CallbackParams { code, next } =
        params.map(|Query(p)| p).unwrap_or_default();

    let Some(code) = code.and_then(AuthCode::new) else {
        log::debug!("no authorization code in the callback");
        return api::found(&routes.login);
    };
    let next = route::Path::or_default(next.as_deref(), &routes.landing);

    let grant = Grant {
        code,
        verifier: context.store().code_verifier(context.jar()),
    };
    match context
        .service()
        .execute(command::ExchangeAuthCode { grant })
        .await
    {
        Ok(session::Issued { session, tokens }) => {
            let store = context.store();
            let jar = store.forget_code_verifier(store.write(
                context.jar().clone(),
                &tokens,
                session.expires_at,
            ));
            (jar, api::found(&next)).into_response()
        }
        Err(e) => {
            log::warn!("failed to exchange authorization code: {e}");
            api::found(&routes.login)
        }
    }
}

/// [`Session`] as seen by clients.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// ID of the signed-in identity.
    pub identity_id: String,

    /// Email of the signed-in identity, if any.
    pub email: Option<String>,

    /// Moment the session expires at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: session::ExpirationDateTime,

    /// Provider the identity has signed in with, if known.
    pub provider: Option<String>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        let Session {
            identity,
            expires_at,
            provider,
        } = session;
        Self {
            identity_id: identity.id.to_string(),
            email: identity.email.as_ref().map(ToString::to_string),
            expires_at,
            provider: provider.as_ref().map(ToString::to_string),
        }
    }
}

/// Returns the current [`Session`] of the client.
///
/// Responds with `401 Unauthorized` if the client holds no valid session.
pub async fn session(context: Context) -> Response {
    match context.current_session().await {
        Ok(session) => {
            (context.cookies(), Json(SessionView::from(session)))
                .into_response()
        }
        Err(e) => (context.cookies(), e).into_response(),
    }
}

/// Signs the client out by removing its session cookies.
pub async fn logout(
    Extension(routes): Extension<Arc<gate::Routes>>,
    context: Context,
) -> (CookieJar, Response) {
    (
        context.store().clear(context.jar().clone()),
        api::found(&routes.login),
    )
}
