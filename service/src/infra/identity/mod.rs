//! [`IdentityProvider`]-related implementations.

#[cfg(feature = "gotrue")]
pub mod gotrue;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "gotrue")]
pub use self::gotrue::GoTrue;

/// Identity provider operation.
pub use common::Handler as IdentityProvider;

/// [`IdentityProvider`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "gotrue")]
    /// [`GoTrue`] error.
    GoTrue(gotrue::Error),
}
