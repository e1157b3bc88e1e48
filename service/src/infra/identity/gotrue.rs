//! [GoTrue]-compatible [`IdentityProvider`] implementation.
//!
//! [GoTrue]: https://github.com/supabase/auth

use std::sync::Arc;

use common::operations::{Exchange, Refresh};
use derive_more::{Debug, Display, Error as StdError, From};
use reqwest::StatusCode;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use tracerr::Traced;

use crate::{
    domain::identity::session::{AccessToken, Grant, RefreshToken, Tokens},
    infra::{identity, IdentityProvider},
};

pub use reqwest::Url;

/// [`GoTrue`] client configuration.
#[derive(Debug)]
pub struct Config {
    /// Base [`Url`] of the auth server, like `https://xyz.supabase.co/auth/v1`.
    pub url: Url,

    /// Public API key sent along with every request.
    #[debug(skip)]
    pub api_key: SecretString,
}

/// [GoTrue]-compatible [`IdentityProvider`] client.
///
/// [GoTrue]: https://github.com/supabase/auth
#[derive(Clone, Debug)]
pub struct GoTrue {
    /// HTTP client performing the requests.
    client: reqwest::Client,

    /// [`Config`] of this [`GoTrue`] client.
    config: Arc<Config>,
}

impl GoTrue {
    /// Creates a new [`GoTrue`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to build the HTTP client.
    pub fn new(config: Config) -> Result<Self, Traced<identity::Error>> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Requests new [`Tokens`] with the provided `grant_type` and `body`.
    async fn token<B: Serialize + ?Sized>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Tokens, Traced<identity::Error>> {
        let url = format!(
            "{}/token",
            self.config.url.as_str().trim_end_matches('/'),
        );
        let resp = self
            .client
            .post(url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_default();
            return Err(tracerr::new!(identity::Error::from(
                Error::Rejected { status, message },
            )));
        }

        let TokenBody {
            access_token,
            refresh_token,
        } = resp
            .json()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Tokens {
            access: AccessToken::new(access_token)
                .ok_or(Error::MissingToken("access_token"))
                .map_err(tracerr::from_and_wrap!(=> identity::Error))?,
            refresh: RefreshToken::new(refresh_token)
                .ok_or(Error::MissingToken("refresh_token"))
                .map_err(tracerr::from_and_wrap!(=> identity::Error))?,
        })
    }
}

impl IdentityProvider<Exchange<Grant>> for GoTrue {
    type Ok = Tokens;
    type Err = Traced<identity::Error>;

    async fn execute(
        &self,
        Exchange(grant): Exchange<Grant>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Body of the [PKCE] grant request.
        ///
        /// [PKCE]: https://datatracker.ietf.org/doc/html/rfc7636
        #[derive(Serialize)]
        struct Body<'a> {
            auth_code: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            code_verifier: Option<&'a str>,
        }

        let Grant { code, verifier } = &grant;
        self.token(
            "pkce",
            &Body {
                auth_code: code.as_ref(),
                code_verifier: verifier.as_ref().map(AsRef::as_ref),
            },
        )
        .await
        .map_err(tracerr::wrap!())
    }
}

impl IdentityProvider<Refresh<RefreshToken>> for GoTrue {
    type Ok = Tokens;
    type Err = Traced<identity::Error>;

    async fn execute(
        &self,
        Refresh(token): Refresh<RefreshToken>,
    ) -> Result<Self::Ok, Self::Err> {
        /// Body of the refresh grant request.
        #[derive(Serialize)]
        struct Body<'a> {
            refresh_token: &'a str,
        }

        self.token(
            "refresh_token",
            &Body {
                refresh_token: token.as_ref(),
            },
        )
        .await
        .map_err(tracerr::wrap!())
    }
}

/// Successful token response.
#[derive(Deserialize)]
struct TokenBody {
    /// Issued access token.
    access_token: String,

    /// Issued refresh token.
    refresh_token: String,
}

/// Error response, shaped differently across [GoTrue] versions.
///
/// [GoTrue]: https://github.com/supabase/auth
#[derive(Deserialize)]
struct ErrorBody {
    /// Description of an OAuth-style error.
    error_description: Option<String>,

    /// Message of an API-style error.
    msg: Option<String>,

    /// Message of a newer API-style error.
    message: Option<String>,
}

impl ErrorBody {
    /// Returns the most descriptive message of this [`ErrorBody`].
    fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

/// [`GoTrue`] client error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed.
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// Auth server rejected the grant.
    #[display("Auth server rejected the grant with `{status}`: {message}")]
    #[from(ignore)]
    Rejected {
        /// HTTP status of the response.
        status: StatusCode,

        /// Message reported by the auth server.
        message: String,
    },

    /// Auth server response misses a token.
    #[display("Auth server response misses `{_0}`")]
    #[from(ignore)]
    MissingToken(#[error(not(source))] &'static str),
}
