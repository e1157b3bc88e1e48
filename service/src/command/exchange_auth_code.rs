//! [`Command`] for exchanging an [`AuthCode`] for a [`Session`].

use common::operations::Exchange;
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{identity::session::AuthCode, Session};
use crate::{
    domain::identity::session::{self, Grant, Tokens},
    infra::{identity, IdentityProvider},
    Service,
};

use super::Command;

/// [`Command`] for exchanging an [`AuthCode`] returned by the identity
/// provider redirect for a [`Session`].
#[derive(Clone, Debug, From)]
pub struct ExchangeAuthCode {
    /// [`Grant`] to exchange.
    pub grant: Grant,
}

impl<Db, Idp> Command<ExchangeAuthCode> for Service<Db, Idp>
where
    Idp: IdentityProvider<
        Exchange<Grant>,
        Ok = Tokens,
        Err = Traced<identity::Error>,
    >,
{
    type Ok = session::Issued;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ExchangeAuthCode,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ExchangeAuthCode { grant } = cmd;

        let tokens = self
            .identity_provider()
            .execute(Exchange(grant))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let session = self
            .verify(&tokens.access)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(session::Issued { session, tokens })
    }
}

/// Error of [`ExchangeAuthCode`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`IdentityProvider`] error.
    #[display("`IdentityProvider` operation failed: {_0}")]
    IdentityProvider(identity::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}
