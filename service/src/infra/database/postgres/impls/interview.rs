//! [`InterviewRecord`]-related [`Database`] implementations.

use common::operations::{By, Select};
use postgres_types::Json;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        interview::{Metrics, OutOfRange, Score},
        InterviewRecord,
    },
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
    read::interview::{list, Owned},
};

/// Columns of an [`InterviewRecord`] row.
const COLUMNS: &str = "\
    id, user_id, created_at, score, \
    COALESCE(good_points, '') AS good_points, \
    COALESCE(advice, '') AS advice, \
    COALESCE(comment, '') AS comment, \
    metrics";

impl<C> Database<Select<By<Vec<InterviewRecord>, list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<InterviewRecord>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<InterviewRecord>, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector { owner, limit } = by.into_inner();
        let limit = i32::from(limit);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM interviews \
             WHERE user_id = $1::UUID \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2::INT4",
        );
        self.query(sql.as_str(), &[&owner, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(record_from_row)
            .collect::<Result<_, _>>()
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C> Database<Select<By<Option<InterviewRecord>, Owned>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<InterviewRecord>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<InterviewRecord>, Owned>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Owned { owner, id } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM interviews \
             WHERE user_id = $1::UUID \
                   AND id = $2::INT8",
        );
        self.query_opt(sql.as_str(), &[&owner, &id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

/// Builds an [`InterviewRecord`] out of the provided [`Row`], checking its
/// ranges.
fn record_from_row(row: &Row) -> Result<InterviewRecord, postgres::Error> {
    let score = Score::new(i64::from(row.try_get::<_, i16>("score")?))
        .ok_or(OutOfRange("score"))?;
    let Json(metrics) = row.try_get::<_, Json<Metrics>>("metrics")?;

    Ok(InterviewRecord {
        id: row.try_get("id")?,
        owner_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        score,
        strengths: row.try_get("good_points")?,
        advice: row.try_get("advice")?,
        comment: row.try_get("comment")?,
        metrics,
    })
}
