//! [`Command`] definition.

pub mod authorize_session;
pub mod exchange_auth_code;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_session::AuthorizeSession, exchange_auth_code::ExchangeAuthCode,
};
