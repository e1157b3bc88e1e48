//! [`InterviewRecord`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, Error, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::identity;

/// Completed interview practice session of an [`Identity`].
///
/// Records are ingested elsewhere and are never modified once created.
///
/// [`Identity`]: identity::Identity
#[derive(Clone, Debug, PartialEq)]
pub struct InterviewRecord {
    /// ID of this [`InterviewRecord`].
    pub id: Id,

    /// ID of the [`Identity`] owning this [`InterviewRecord`].
    ///
    /// [`Identity`]: identity::Identity
    pub owner_id: identity::Id,

    /// [`DateTime`] when this [`InterviewRecord`] was created.
    pub created_at: CreationDateTime,

    /// Total [`Score`] of the interview.
    pub score: Score,

    /// What went well during the interview.
    pub strengths: String,

    /// Advice on what to improve.
    pub advice: String,

    /// Overall comment on the interview.
    pub comment: String,

    /// Per-dimension [`Metrics`] of the interview.
    pub metrics: Metrics,
}

/// ID of an [`InterviewRecord`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(i64);

impl Id {
    /// Creates a new [`Id`] if the given `id` may identify a record.
    #[must_use]
    pub fn new(id: i64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Parses an untrusted [`Id`] representation.
    ///
    /// [`None`] is returned for non-numeric, non-positive or overflowing
    /// values.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().and_then(Self::new)
    }
}

/// Total score of an interview, in `0..=100` range.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Score(u8);

impl Score {
    /// Maximum value of a [`Score`].
    pub const MAX: u8 = 100;

    /// Creates a new [`Score`] if the given `score` is in range.
    #[must_use]
    pub fn new(score: i64) -> Option<Self> {
        u8::try_from(score)
            .ok()
            .filter(|s| *s <= Self::MAX)
            .map(Self)
    }

    /// Returns the rounded average of the provided [`Score`]s.
    ///
    /// Empty input averages to zero.
    #[must_use]
    pub fn average(scores: impl IntoIterator<Item = Self>) -> Self {
        let (sum, count) = scores
            .into_iter()
            .fold((0_u64, 0_u64), |(sum, count), s| {
                (sum + u64::from(s.0), count + 1)
            });
        if count == 0 {
            return Self(0);
        }
        // Rounds half up, the average never leaves the range.
        Self(u8::try_from((sum * 2 + count) / (count * 2)).unwrap_or(Self::MAX))
    }
}

/// Single dimension of [`Metrics`], in `0.0..=5.0` range.
#[derive(Clone, Copy, Debug, Display, Into, PartialEq, PartialOrd, Serialize)]
#[serde(into = "f64")]
pub struct Metric(f64);

impl Metric {
    /// Maximum value of a [`Metric`].
    pub const MAX: f64 = 5.0;

    /// Creates a new [`Metric`] if the given `value` is in range.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (0.0..=Self::MAX).contains(&value).then_some(Self(value))
    }
}

impl TryFrom<f64> for Metric {
    type Error = OutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange("metric"))
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Self::try_from(f64::deserialize(deserializer)?)
            .map_err(serde::de::Error::custom)
    }
}

/// Fixed set of interview dimensions, used for presentation only.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Metrics {
    /// How well the voice carried.
    pub voice_volume: Metric,

    /// Quality of the answers.
    pub response_quality: Metric,

    /// How well the answers matched the company.
    pub company_match: Metric,

    /// Use of concrete episodes.
    pub episodes: Metric,

    /// Clarity of the speech.
    pub clarity: Metric,
}

/// Error of a value being out of its domain range.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`{_0}` is out of range")]
pub struct OutOfRange(#[error(not(source))] pub &'static str);

/// [`DateTime`] when an [`InterviewRecord`] was created.
pub type CreationDateTime = DateTimeOf<(InterviewRecord, unit::Creation)>;
