//! Service contains the session and interview records business logic.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use derive_more::Debug;
use jsonwebtoken::{Algorithm, Validation};

use self::domain::{
    identity::session::{AccessToken, Claims},
    Session,
};
#[cfg(doc)]
use self::infra::{Database, IdentityProvider};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key verifying [`AccessToken`]s.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Audience [`AccessToken`]s must be issued for.
    pub jwt_audience: String,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Idp> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`IdentityProvider`] of this [`Service`].
    identity_provider: Idp,
}

impl<Db, Idp> Service<Db, Idp> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db, identity_provider: Idp) -> Self {
        Self {
            config,
            database,
            identity_provider,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`IdentityProvider`] of this [`Service`].
    #[must_use]
    pub fn identity_provider(&self) -> &Idp {
        &self.identity_provider
    }

    /// Verifies the provided [`AccessToken`] and extracts the [`Session`] it
    /// proves.
    fn verify(
        &self,
        token: &AccessToken,
    ) -> Result<Session, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.jwt_audience]);

        jsonwebtoken::decode::<Claims>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &validation,
        )
        .map(|data| data.claims.into())
    }
}

#[cfg(test)]
mod test_support;
