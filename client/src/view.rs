//! [`MyPage`] view definitions.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::operations::Select;
use derive_more::Debug;
use futures::future::{AbortHandle, Abortable};
use service::read::interview::Request;
use tokio::sync::watch;
use tracing as log;

use crate::{
    model::{Record, Records, Session},
    readiness,
    source::{RecordSource, Scoped, SessionSource},
    Config,
};

/// Navigation performed by the rendering layer.
pub trait Navigator {
    /// Replaces the current location with the provided `path`.
    fn replace(&self, path: &str);
}

/// State of the [`MyPage`] view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    /// History of the most recent [`Record`]s, newest first.
    pub records: Vec<Record>,

    /// Rounded average score of the `records`.
    pub average_score: u8,

    /// Whether the `records` are being loaded.
    pub loading: bool,

    /// [`Record`] shown in detail.
    pub detail: Option<Record>,

    /// Whether the `detail` is being loaded.
    pub detail_loading: bool,
}

impl State {
    /// Returns the [`State`] of a freshly mounted view serving the provided
    /// `request`.
    fn mounted(request: Request) -> Self {
        match request {
            Request::List => Self {
                loading: true,
                ..Self::default()
            },
            Request::Detail(_) | Request::UnknownRecord => Self {
                detail_loading: true,
                ..Self::default()
            },
        }
    }
}

/// Interview history page of the signed-in identity.
#[derive(Debug)]
pub struct MyPage<S, R, N> {
    /// Source of the client [`Session`].
    sessions: S,

    /// Source of the interview [`Records`].
    records: R,

    /// [`Navigator`] leaving the page once the session is gone.
    #[debug(skip)]
    navigator: N,

    /// Client [`Config`].
    config: Config,

    /// What the page shows.
    request: Request,
}

impl<S, R, N> MyPage<S, R, N>
where
    S: SessionSource,
    R: RecordSource,
    N: Navigator,
{
    /// Creates a new [`MyPage`] out of its `view` and `id` location
    /// parameters.
    #[must_use]
    pub fn new(
        sessions: S,
        records: R,
        navigator: N,
        config: Config,
        (view, id): (Option<&str>, Option<&str>),
    ) -> Self {
        Self {
            sessions,
            records,
            navigator,
            config,
            request: Request::from_params(view, id),
        }
    }

    /// Mounts this [`MyPage`].
    ///
    /// The returned task drives the page and is expected to be spawned by the
    /// caller. Dropping the returned [`Handle`] tears the page down.
    pub fn mount(self) -> (Handle, Abortable<impl Future<Output = ()>>) {
        let (state, changes) = watch::channel(State::mounted(self.request));
        let slot = Arc::new(Slot(Mutex::new(Some(state))));
        let (abort, registration) = AbortHandle::new_pair();

        let task = Abortable::new(self.run(Arc::clone(&slot)), registration);
        (
            Handle {
                changes,
                slot,
                abort,
            },
            task,
        )
    }

    /// Drives this [`MyPage`] until the session is gone.
    async fn run(self, slot: Arc<Slot>) {
        let mut subscription = self.sessions.subscribe();

        let session = match readiness::poll(&self.sessions, &self.config).await
        {
            readiness::State::Ready(session) => session,
            readiness::State::Checking(_)
            | readiness::State::Unauthenticated => {
                log::debug!("no session appeared, leaving the page");
                return self.leave(&slot);
            }
        };

        self.load(session, &slot).await;

        while let Some(change) = subscription.changed().await {
            if change.is_none() {
                log::debug!("session is gone, leaving the page");
                return self.leave(&slot);
            }
        }
    }

    /// Loads the requested [`Records`] on behalf of the ready [`Session`].
    async fn load(&self, session: Session, slot: &Slot) {
        if self.request == Request::UnknownRecord {
            return slot.update(|s| s.detail_loading = false);
        }

        let records = self
            .records
            .execute(Select(Scoped {
                session,
                request: self.request,
            }))
            .await;
        match records {
            Ok(Records::List {
                records,
                average_score,
            }) => slot.update(|s| {
                s.records = records;
                s.average_score = average_score;
                s.loading = false;
            }),
            Ok(Records::Detail { record }) => slot.update(|s| {
                s.detail = record;
                s.detail_loading = false;
            }),
            Err(e) => {
                log::error!("failed to load interview records: {e}");
                slot.update(|s| {
                    s.loading = false;
                    s.detail_loading = false;
                });
            }
        }
    }

    /// Clears the held data and navigates to the login path, unless the page
    /// has been torn down already.
    ///
    /// Navigation happens outside of the [`Slot`] lock, as it may tear the
    /// page down.
    fn leave(&self, slot: &Slot) {
        let mounted = slot.apply(|state| {
            _ = state.send_replace(State::default());
        });
        if mounted {
            self.navigator.replace(&self.config.login_path);
        }
    }
}

/// Handle of a mounted [`MyPage`].
///
/// Tears the page down once dropped: its pending session reads and
/// [`Subscription`] are cancelled, and its [`State`] stops changing.
///
/// [`Subscription`]: crate::Subscription
#[derive(Debug)]
pub struct Handle {
    /// Receiver of the [`State`] changes.
    changes: watch::Receiver<State>,

    /// [`Slot`] of the [`State`] updates.
    slot: Arc<Slot>,

    /// [`AbortHandle`] of the page task.
    abort: AbortHandle,
}

impl Handle {
    /// Returns the current [`State`] of the page.
    #[must_use]
    pub fn state(&self) -> State {
        self.changes.borrow().clone()
    }

    /// Returns a receiver of the [`State`] changes.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<State> {
        self.changes.clone()
    }

    /// Tears the page down.
    pub fn teardown(self) {
        drop(self);
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.slot.close();
        self.abort.abort();
    }
}

/// Slot of [`State`] updates, closed on teardown.
#[derive(Debug)]
struct Slot(Mutex<Option<watch::Sender<State>>>);

impl Slot {
    /// Applies the provided `f` to the [`State`] sender, unless closed.
    ///
    /// Returns whether `f` has been applied.
    fn apply(&self, f: impl FnOnce(&watch::Sender<State>)) -> bool {
        self.lock().as_ref().map(f).is_some()
    }

    /// Modifies the [`State`], unless closed.
    fn update(&self, f: impl FnOnce(&mut State)) {
        _ = self.apply(|state| state.send_modify(f));
    }

    /// Closes this [`Slot`], so no update applies afterwards.
    fn close(&self) {
        drop(self.lock().take());
    }

    /// Locks this [`Slot`].
    fn lock(&self) -> MutexGuard<'_, Option<watch::Sender<State>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
