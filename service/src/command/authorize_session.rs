//! [`Command`] for authorizing a [`Session`].

use common::operations::Refresh;
use derive_more::{Display, Error, From};
use jsonwebtoken::errors::ErrorKind;
use tracerr::Traced;

use crate::{
    domain::{
        identity::session::{AccessToken, RefreshToken, Tokens},
        Session,
    },
    infra::{identity, IdentityProvider},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] out of the tokens a client
/// holds.
///
/// An expired (or already dropped) [`AccessToken`] is renewed with the
/// [`RefreshToken`], if there is one.
#[derive(Clone, Debug, Default)]
pub struct AuthorizeSession {
    /// [`AccessToken`] held by the client.
    pub access: Option<AccessToken>,

    /// [`RefreshToken`] held by the client.
    pub refresh: Option<RefreshToken>,
}

/// Authorized [`Session`].
#[derive(Clone, Debug)]
pub struct Authorized {
    /// Verified [`Session`].
    pub session: Session,

    /// New [`Tokens`] the client must persist, if they have been refreshed.
    pub refreshed: Option<Tokens>,
}

impl<Db, Idp> Command<AuthorizeSession> for Service<Db, Idp>
where
    Idp: IdentityProvider<
        Refresh<RefreshToken>,
        Ok = Tokens,
        Err = Traced<identity::Error>,
    >,
{
    type Ok = Authorized;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeSession { access, refresh } = cmd;

        if let Some(access) = access {
            match self.verify(&access) {
                Ok(session) => {
                    return Ok(Authorized {
                        session,
                        refreshed: None,
                    });
                }
                Err(e)
                    if refresh.is_none()
                        || !matches!(e.kind(), ErrorKind::ExpiredSignature) =>
                {
                    return Err(tracerr::new!(E::from(e)));
                }
                Err(_) => {}
            }
        }

        let refresh = refresh.ok_or(E::NoSession).map_err(tracerr::wrap!())?;
        let tokens = self
            .identity_provider()
            .execute(Refresh(refresh))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let session = self
            .verify(&tokens.access)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Authorized {
            session,
            refreshed: Some(tokens),
        })
    }
}

/// Error of [`AuthorizeSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`IdentityProvider`] error.
    #[display("`IdentityProvider` operation failed: {_0}")]
    IdentityProvider(identity::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// Client holds no tokens.
    #[display("No `Session` is present")]
    NoSession,
}
