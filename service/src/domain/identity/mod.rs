//! [`Identity`] definitions.

pub mod session;

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Authenticated principal, as asserted by the identity provider.
///
/// Never created by this service: it only comes out of a verified
/// [`Session`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    /// ID of this [`Identity`].
    pub id: Id,

    /// [`Email`] of this [`Identity`], if the provider shares one.
    pub email: Option<Email>,
}

/// ID of an [`Identity`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Email address of an [`Identity`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` looks like an [`Email`].
    ///
    /// The provider has already verified the address, so only its shape is
    /// checked here.
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] shape.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 320 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

#[cfg(test)]
mod tests {
    use super::{Email, Id};

    #[test]
    fn parses_ids() {
        let id: Id = "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7".parse().unwrap();

        assert_eq!(id.to_string(), "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7");
        assert!("42".parse::<Id>().is_err());
    }

    #[test]
    fn checks_email_shape() {
        assert!(Email::new("taro@example.com").is_some());
        assert!(Email::new("taro@").is_none());
        assert!(Email::new("taro example@example.com").is_none());
        assert!(Email::new("").is_none());
    }
}
