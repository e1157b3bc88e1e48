//! [`Context`]-related definitions.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::CookieJar;
use service::{
    command::{self, authorize_session::Authorized, Command as _},
    domain::Session,
};
use tokio::sync::OnceCell;

use crate::{define_error, session, AsError, Error, Service};

/// Request context carrying the session of the client.
///
/// The session is authorized lazily, at most once per request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`session::Store`] the client tokens are kept in.
    store: Arc<session::Store>,

    /// Cookies of the HTTP request.
    jar: CookieJar,

    /// Outcome of the [`Session`] authorization.
    authorized: OnceCell<Result<Authorized, Error>>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns [`session::Store`] of this [`Context`].
    #[must_use]
    pub fn store(&self) -> &session::Store {
        &self.store
    }

    /// Returns the cookies of the HTTP request.
    #[must_use]
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Returns the current [`Session`] of this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the client holds no session;
    /// - the held session is invalid and cannot be refreshed.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.authorized
            .get_or_init(|| self.do_authentication())
            .await
            .as_ref()
            .map(|a| a.session.clone())
            .map_err(Clone::clone)
    }

    /// Returns the cookies to attach to the response.
    ///
    /// Carries the new tokens if the session has been refreshed while
    /// authorizing, and nothing otherwise.
    #[must_use]
    pub fn cookies(&self) -> CookieJar {
        match self.authorized.get() {
            Some(Ok(Authorized {
                session,
                refreshed: Some(tokens),
            })) => {
                self.store.write(self.jar.clone(), tokens, session.expires_at)
            }
            Some(Ok(_) | Err(_)) | None => self.jar.clone(),
        }
    }

    /// Performs the [`Session`] authorization.
    async fn do_authentication(&self) -> Result<Authorized, Error> {
        self.service
            .execute(self.store.read(&self.jar))
            .await
            .map_err(AsError::into_error)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let store = parts
            .extensions
            .get::<Arc<session::Store>>()
            .cloned()
            .ok_or_else(|| {
                Error::internal(&"missing `session::Store` extension")
            })?;

        Ok(Self {
            service,
            store,
            jar: CookieJar::from_headers(&parts.headers),
            authorized: OnceCell::new(),
        })
    }
}

impl AsError for command::authorize_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::IdentityProvider(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::NoSession => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,
    }
}
