//! Infrastructure layer.

pub mod database;
pub mod identity;

pub use self::{database::Database, identity::IdentityProvider};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
#[cfg(feature = "gotrue")]
pub use self::identity::{gotrue, GoTrue};
