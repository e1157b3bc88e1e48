//! Sources of the data the client views depend on.

use std::fmt::Display;

use common::{operations::Select, Handler};
use derive_more::Debug;
use service::read::interview::Request;
use tokio::sync::watch;

use crate::model::{Records, Session};

/// Operation of reading the current [`Session`] of the client.
#[derive(Clone, Copy, Debug)]
pub struct CurrentSession;

/// [`Request`] for interview [`Records`] on behalf of a ready [`Session`].
#[derive(Clone, Debug)]
pub struct Scoped {
    /// [`Session`] the [`Records`] are read on behalf of.
    pub session: Session,

    /// What to read.
    pub request: Request,
}

/// Source of the client [`Session`].
pub trait SessionSource:
    Handler<Select<CurrentSession>, Ok = Option<Session>, Err: Display>
{
    /// Subscribes to the changes of the client [`Session`] until the returned
    /// [`Subscription`] is dropped.
    fn subscribe(&self) -> Subscription;
}

/// Source of the interview [`Records`] of the client.
pub trait RecordSource:
    Handler<Select<Scoped>, Ok = Records, Err: Display>
{
}

impl<T> RecordSource for T where
    T: Handler<Select<Scoped>, Ok = Records, Err: Display>
{
}

/// Subscription to [`Session`] changes.
///
/// Unsubscribes exactly once, when dropped.
#[derive(Debug)]
pub struct Subscription {
    /// Receiver of the [`Session`] changes.
    changes: watch::Receiver<Option<Session>>,

    /// Disposer releasing this [`Subscription`] in its source.
    #[debug(skip)]
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Creates a new [`Subscription`] to the provided `changes`, calling
    /// `unsubscribe` once it is dropped.
    #[must_use]
    pub fn new(
        changes: watch::Receiver<Option<Session>>,
        unsubscribe: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            changes,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Waits for the next [`Session`] change.
    ///
    /// [`None`] is returned once the source is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.changes.changed().await.ok()?;
        Some(self.changes.borrow_and_update().clone())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}
