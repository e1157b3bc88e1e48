//! [`Query`] collection related to [`InterviewRecord`]s.

use std::convert::Infallible;

use common::operations::By;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{InterviewRecord, Session},
    infra::database,
    read::interview::{list, Owned, Records, Request},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries the most recent [`InterviewRecord`]s of an owner.
pub type History = DatabaseQuery<By<Vec<InterviewRecord>, list::Selector>>;

/// Queries a single [`InterviewRecord`] by its ID, constrained to an owner.
pub type OwnedById = DatabaseQuery<By<Option<InterviewRecord>, Owned>>;

/// [`Query`] reading the [`InterviewRecord`]s of a [`Session`]'s owner.
///
/// Never fails: storage errors are logged and read as no records at all.
#[derive(Clone, Debug)]
pub struct Scoped {
    /// [`Session`] whose [`Identity`] owns the records.
    ///
    /// [`Identity`]: crate::domain::Identity
    pub session: Session,

    /// What to read.
    pub request: Request,
}

impl<Db, Idp> Query<Scoped> for Service<Db, Idp>
where
    Self: Query<
            History,
            Ok = Vec<InterviewRecord>,
            Err = Traced<database::Error>,
        > + Query<
            OwnedById,
            Ok = Option<InterviewRecord>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Records;
    type Err = Infallible;

    async fn execute(&self, query: Scoped) -> Result<Self::Ok, Self::Err> {
        let Scoped { session, request } = query;
        let owner = session.identity.id;

        Ok(match request {
            Request::List => Records::List(
                self.execute(History::by(list::Selector::history(owner)))
                    .await
                    .map_or_else(
                        |e| {
                            log::error!(
                                "Failed to list `InterviewRecord`s of \
                                 `Identity(id: {owner})`: {e}",
                            );
                            list::Page::default()
                        },
                        list::Page::from,
                    ),
            ),
            Request::Detail(id) => Records::Detail(
                self.execute(OwnedById::by(Owned { owner, id }))
                    .await
                    .unwrap_or_else(|e| {
                        log::error!(
                            "Failed to read `InterviewRecord(id: {id})` of \
                             `Identity(id: {owner})`: {e}",
                        );
                        None
                    }),
            ),
            Request::UnknownRecord => Records::Detail(None),
        })
    }
}
