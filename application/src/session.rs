//! Session cookies [`Store`].

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::{
    command::AuthorizeSession,
    domain::identity::session::{
        AccessToken, CodeVerifier, ExpirationDateTime, RefreshToken, Tokens,
    },
};

/// Adapter persisting session [`Tokens`] in cookies.
///
/// Every cookie is `HttpOnly`, `SameSite=Lax` and scoped to `/`.
#[derive(Clone, Debug)]
pub struct Store {
    /// Name of the [`AccessToken`] cookie.
    access: String,

    /// Name of the [`RefreshToken`] cookie.
    refresh: String,

    /// Name of the [`CodeVerifier`] cookie, set by the login page.
    verifier: String,

    /// Whether the cookies are sent over HTTPS only.
    secure: bool,

    /// Lifetime of the [`RefreshToken`] cookie.
    refresh_max_age: Duration,
}

impl Store {
    /// Creates a new [`Store`] of cookies named with the provided `prefix`.
    #[must_use]
    pub fn new(prefix: &str, secure: bool, refresh_max_age: Duration) -> Self {
        Self {
            access: format!("{prefix}-access-token"),
            refresh: format!("{prefix}-refresh-token"),
            verifier: format!("{prefix}-code-verifier"),
            secure,
            refresh_max_age,
        }
    }

    /// Reads the tokens held by the client out of the provided [`CookieJar`].
    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> AuthorizeSession {
        AuthorizeSession {
            access: jar
                .get(&self.access)
                .and_then(|c| AccessToken::new(c.value())),
            refresh: jar
                .get(&self.refresh)
                .and_then(|c| RefreshToken::new(c.value())),
        }
    }

    /// Reads the [`CodeVerifier`] of the ongoing sign-in, if any.
    #[must_use]
    pub fn code_verifier(&self, jar: &CookieJar) -> Option<CodeVerifier> {
        jar.get(&self.verifier)
            .and_then(|c| CodeVerifier::new(c.value()))
    }

    /// Writes the provided [`Tokens`] of a session expiring at `expires_at`.
    #[must_use]
    pub fn write(
        &self,
        jar: CookieJar,
        tokens: &Tokens,
        expires_at: ExpirationDateTime,
    ) -> CookieJar {
        jar.add(self.cookie(
            &self.access,
            tokens.access.as_ref(),
            expires_at.remaining().unwrap_or_default(),
        ))
        .add(self.cookie(
            &self.refresh,
            tokens.refresh.as_ref(),
            self.refresh_max_age,
        ))
    }

    /// Forgets the [`CodeVerifier`] once the sign-in is complete.
    #[must_use]
    pub fn forget_code_verifier(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Self::removal(&self.verifier))
    }

    /// Removes all the session cookies the client holds.
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Self::removal(&self.access))
            .remove(Self::removal(&self.refresh))
            .remove(Self::removal(&self.verifier))
    }

    /// Builds a session [`Cookie`].
    fn cookie(
        &self,
        name: &str,
        value: &str,
        max_age: Duration,
    ) -> Cookie<'static> {
        Cookie::build((name.to_owned(), value.to_owned()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure)
            .max_age(
                time::Duration::try_from(max_age)
                    .unwrap_or(time::Duration::MAX),
            )
            .build()
    }

    /// Builds a [`Cookie`] matching the one to remove.
    fn removal(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_owned(), "")).path("/").build()
    }
}
