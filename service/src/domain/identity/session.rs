//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display, From};
use serde::Deserialize;

use super::{Email, Identity};

/// Verified session of an [`Identity`].
///
/// Only ever produced by verifying an [`AccessToken`], so holding one means
/// the request has been authenticated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    /// [`Identity`] this [`Session`] is bound to.
    pub identity: Identity,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: ExpirationDateTime,

    /// [`Provider`] the [`Identity`] has signed in with, if known.
    pub provider: Option<Provider>,
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

/// Name of the identity provider a [`Session`] was issued through.
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str, String)]
pub struct Provider(String);

/// Claims of an [`AccessToken`] this service relies on.
#[derive(Clone, Debug, Deserialize)]
pub struct Claims {
    /// ID of the [`Identity`] the token is issued for.
    #[serde(rename = "sub")]
    pub identity_id: super::Id,

    /// Email of the [`Identity`], if any.
    #[serde(default)]
    pub email: Option<String>,

    /// [`DateTime`] when the token expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,

    /// Provider-specific metadata.
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

/// Provider-specific metadata of [`Claims`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppMetadata {
    /// Name of the provider used to sign in.
    #[serde(default)]
    pub provider: Option<String>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        let Claims {
            identity_id,
            email,
            expires_at,
            app_metadata,
        } = claims;

        Self {
            identity: Identity {
                id: identity_id,
                email: email.and_then(Email::new),
            },
            expires_at,
            provider: app_metadata
                .provider
                .filter(|p| !p.is_empty())
                .map(Provider),
        }
    }
}

/// Provider-signed access token proving a [`Session`].
#[derive(AsRef, Clone, Debug, Eq, PartialEq)]
#[as_ref(str)]
#[debug("AccessToken(..)")]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps the provided raw `token`, if it is not blank.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        non_blank(token.into()).map(Self)
    }
}

/// Token used to obtain a fresh [`AccessToken`] once the current one expires.
#[derive(AsRef, Clone, Debug, Eq, PartialEq)]
#[as_ref(str)]
#[debug("RefreshToken(..)")]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wraps the provided raw `token`, if it is not blank.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        non_blank(token.into()).map(Self)
    }
}

/// OAuth authorization code returned by the provider redirect.
#[derive(AsRef, Clone, Debug, Eq, PartialEq)]
#[as_ref(str)]
#[debug("AuthCode(..)")]
pub struct AuthCode(String);

impl AuthCode {
    /// Wraps the provided raw `code`, if it is not blank.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        non_blank(code.into()).map(Self)
    }
}

/// [PKCE] code verifier accompanying an [`AuthCode`].
///
/// [PKCE]: https://datatracker.ietf.org/doc/html/rfc7636
#[derive(AsRef, Clone, Debug, Eq, PartialEq)]
#[as_ref(str)]
#[debug("CodeVerifier(..)")]
pub struct CodeVerifier(String);

impl CodeVerifier {
    /// Wraps the provided raw `verifier`, if it is not blank.
    #[must_use]
    pub fn new(verifier: impl Into<String>) -> Option<Self> {
        non_blank(verifier.into()).map(Self)
    }
}

/// Grant presented to the provider to obtain [`Tokens`] after its redirect.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grant {
    /// [`AuthCode`] returned by the provider redirect.
    pub code: AuthCode,

    /// [`CodeVerifier`] of the flow, if it has been started with [PKCE].
    ///
    /// [PKCE]: https://datatracker.ietf.org/doc/html/rfc7636
    pub verifier: Option<CodeVerifier>,
}

/// Pair of tokens the provider issues for a [`Session`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tokens {
    /// [`AccessToken`] proving the [`Session`].
    pub access: AccessToken,

    /// [`RefreshToken`] prolonging the [`Session`].
    pub refresh: RefreshToken,
}

/// [`Session`] freshly issued by the provider along with its [`Tokens`].
#[derive(Clone, Debug)]
pub struct Issued {
    /// Verified [`Session`].
    pub session: Session,

    /// [`Tokens`] to persist on the client.
    pub tokens: Tokens,
}

/// Returns the provided `value` unless it's empty or whitespace only.
fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::{AccessToken, AuthCode, Claims, Session};

    #[test]
    fn rejects_blank_tokens() {
        assert!(AccessToken::new("").is_none());
        assert!(AuthCode::new("   ").is_none());
        assert!(AuthCode::new("4/0AbCd").is_some());
    }

    #[test]
    fn hides_tokens_in_debug_output() {
        let token = AccessToken::new("eyJhbGciOi.secret.sig").unwrap();

        assert_eq!(format!("{token:?}"), "AccessToken(..)");
    }

    #[test]
    fn builds_session_from_claims() {
        let claims: Claims = serde_json::from_str(
            r#"{
                "sub": "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7",
                "email": "taro@example.com",
                "exp": 1700000000,
                "aud": "authenticated",
                "app_metadata": {"provider": "google"}
            }"#,
        )
        .unwrap();

        let session = Session::from(claims);
        assert_eq!(
            session.identity.id.to_string(),
            "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7",
        );
        assert_eq!(
            session.identity.email.as_ref().map(ToString::to_string),
            Some("taro@example.com".to_owned()),
        );
        assert_eq!(session.expires_at.unix_timestamp(), 1_700_000_000);
        assert_eq!(
            session.provider.as_ref().map(ToString::to_string),
            Some("google".to_owned()),
        );
    }

    #[test]
    fn tolerates_missing_optional_claims() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub": "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7", "exp": 1}"#,
        )
        .unwrap();

        let session = Session::from(claims);
        assert_eq!(session.identity.email, None);
        assert_eq!(session.provider, None);
    }
}
