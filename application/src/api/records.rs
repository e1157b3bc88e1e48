//! Interview records HTTP handlers.

use axum::{extract::Query, Extension, Json};
use serde::{Deserialize, Serialize};
use service::{
    domain::{
        interview::{CreationDateTime, Metrics},
        InterviewRecord, Session,
    },
    query::{self, Query as _},
    read::interview::{Records, Request},
};

use crate::Service;

/// Query parameters selecting the records view.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// View discriminator, `detail` for a single record.
    pub view: Option<String>,

    /// ID of the record to show in detail.
    pub id: Option<String>,
}

/// [`InterviewRecord`] as seen by clients.
#[derive(Debug, Serialize)]
pub struct Record {
    /// ID of the record.
    pub id: i64,

    /// Moment the record was created at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: CreationDateTime,

    /// Total score, in `0..=100` range.
    pub score: u8,

    /// What went well.
    pub strengths: String,

    /// What to improve.
    pub advice: String,

    /// Overall comment.
    pub comment: String,

    /// Per-dimension metrics.
    pub metrics: Metrics,
}

impl From<InterviewRecord> for Record {
    fn from(record: InterviewRecord) -> Self {
        let InterviewRecord {
            id,
            owner_id: _,
            created_at,
            score,
            strengths,
            advice,
            comment,
            metrics,
        } = record;
        Self {
            id: id.into(),
            created_at,
            score: score.into(),
            strengths,
            advice,
            comment,
            metrics,
        }
    }
}

/// Response of the records view.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    /// History of the most recent records.
    List {
        /// Records, newest first.
        records: Vec<Record>,

        /// Rounded average score of the `records`.
        average_score: u8,
    },

    /// Single record, `null` when not found.
    Detail {
        /// Found record.
        record: Option<Record>,
    },
}

impl From<Records> for View {
    fn from(records: Records) -> Self {
        match records {
            Records::List(page) => Self::List {
                records: page.records.into_iter().map(Record::from).collect(),
                average_score: page.average_score,
            },
            Records::Detail(record) => Self::Detail {
                record: record.map(Record::from),
            },
        }
    }
}

/// Reads the interview records of the signed-in identity.
///
/// Never fails: storage errors read as no records.
pub async fn read(
    Extension(service): Extension<Service>,
    Extension(session): Extension<Session>,
    params: Option<Query<Params>>,
) -> Json<View> {
    let Params { view, id } = params.map(|Query(p)| p).unwrap_or_default();
    let request = Request::from_params(view.as_deref(), id.as_deref());

    let records = match service
        .execute(query::interview::Scoped { session, request })
        .await
    {
        Ok(records) => records,
        Err(never) => match never {},
    };
    Json(records.into())
}
