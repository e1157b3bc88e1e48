//! Data the application serves to clients.

use common::DateTime;
use serde::Deserialize;

pub use service::domain::interview::Metrics;

/// Session of the signed-in identity.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Session {
    /// ID of the signed-in identity.
    pub identity_id: String,

    /// Email of the signed-in identity, if any.
    pub email: Option<String>,

    /// Moment the session expires at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: DateTime,

    /// Provider the identity has signed in with, if known.
    pub provider: Option<String>,
}

/// Completed interview practice session.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Record {
    /// ID of this [`Record`].
    pub id: i64,

    /// Moment this [`Record`] was created at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: DateTime,

    /// Total score, in `0..=100` range.
    pub score: u8,

    /// What went well.
    pub strengths: String,

    /// What to improve.
    pub advice: String,

    /// Overall comment.
    pub comment: String,

    /// Per-dimension [`Metrics`].
    pub metrics: Metrics,
}

/// Interview [`Record`]s of the signed-in identity.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Records {
    /// Most recent [`Record`]s.
    List {
        /// [`Record`]s, newest first.
        records: Vec<Record>,

        /// Rounded average score of the `records`.
        average_score: u8,
    },

    /// Single [`Record`].
    Detail {
        /// Requested [`Record`], if found.
        record: Option<Record>,
    },
}
