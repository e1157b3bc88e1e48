//! Session readiness polling.
//!
//! Right after the sign-in redirect the session cookies may not be visible
//! yet, so the session is read a bounded number of times with a fixed delay
//! before the client is considered unauthenticated.

use common::operations::Select;
use tokio::time;
use tracing as log;

use crate::{
    model::Session,
    source::{CurrentSession, SessionSource},
    Config,
};

/// State of the session readiness.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum State {
    /// Session is being read, with the number of reads already failed.
    Checking(u32),

    /// Session is present.
    Ready(Session),

    /// No session appeared within the attempts budget.
    Unauthenticated,
}

impl Default for State {
    fn default() -> Self {
        Self::Checking(0)
    }
}

impl State {
    /// Advances this [`State`] with the outcome of a session `read`, allowing
    /// at most `attempts` retries.
    #[must_use]
    pub fn advance(self, read: Option<Session>, attempts: u32) -> Self {
        match (self, read) {
            (Self::Checking(_), Some(session)) => Self::Ready(session),
            (Self::Checking(failed), None) if failed < attempts => {
                Self::Checking(failed + 1)
            }
            (Self::Checking(_), None) => Self::Unauthenticated,
            (settled @ (Self::Ready(_) | Self::Unauthenticated), _) => settled,
        }
    }

    /// Indicates whether this [`State`] is final.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Checking(_))
    }
}

/// Reads the session from the provided `source` until it is present or the
/// configured attempts are exhausted.
///
/// Never returns [`State::Checking`]. Failed reads count as absent session.
pub async fn poll<S>(source: &S, config: &Config) -> State
where
    S: SessionSource,
{
    let mut state = State::default();
    loop {
        let read = source
            .execute(Select(CurrentSession))
            .await
            .unwrap_or_else(|e| {
                log::warn!("failed to read session: {e}");
                None
            });

        state = state.advance(read, config.attempts);
        match &state {
            State::Checking(failed) => {
                log::debug!(
                    "session is not ready after {failed} read(s), retrying \
                     in {:?}",
                    config.backoff,
                );
                time::sleep(config.backoff).await;
            }
            State::Ready(_) | State::Unauthenticated => return state,
        }
    }
}
