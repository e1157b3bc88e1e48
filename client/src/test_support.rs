//! In-memory sources and navigation for tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use common::{operations::Select, DateTime, Handler};
use service::{
    domain::interview::{Metric, Metrics},
    read::interview::Request,
};
use tokio::sync::watch;

use crate::{
    model::{Record, Records, Session},
    source::{CurrentSession, Scoped, SessionSource, Subscription},
    Navigator,
};

/// Session of the signed-in identity.
pub(crate) fn session() -> Session {
    Session {
        identity_id: "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7".to_owned(),
        email: Some("taro@example.com".to_owned()),
        expires_at: DateTime::from_unix_timestamp(1_900_000_000).unwrap(),
        provider: Some("google".to_owned()),
    }
}

/// Interview record with the provided `id`.
pub(crate) fn record(id: i64) -> Record {
    let metric = Metric::new(3.0).unwrap();
    Record {
        id,
        created_at: DateTime::from_unix_timestamp(1_700_000_000 + id * 60)
            .unwrap(),
        score: match id {
            1 => 80,
            2 => 64,
            _ => 72,
        },
        strengths: "Calm".to_owned(),
        advice: "Be concise".to_owned(),
        comment: format!("Interview #{id}"),
        metrics: Metrics {
            voice_volume: metric,
            response_quality: metric,
            company_match: metric,
            episodes: metric,
            clarity: metric,
        },
    }
}

/// How [`Sessions`] answer reads.
#[derive(Clone, Copy, Debug)]
enum Mode {
    /// Session is present starting from the read with this index.
    AppearingAfter(usize),

    /// Session never appears.
    Absent,

    /// Every read fails.
    Failing,
}

/// Session source counting its reads and subscribers.
#[derive(Clone, Debug)]
pub(crate) struct Sessions {
    mode: Mode,
    reads: Arc<AtomicUsize>,
    subscribers: Arc<AtomicUsize>,
    changes: Arc<watch::Sender<Option<Session>>>,
}

impl Sessions {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            reads: Arc::default(),
            subscribers: Arc::default(),
            changes: Arc::new(watch::channel(None).0),
        }
    }

    pub(crate) fn appearing_after(absent_reads: usize) -> Self {
        Self::new(Mode::AppearingAfter(absent_reads))
    }

    pub(crate) fn absent() -> Self {
        Self::new(Mode::Absent)
    }

    pub(crate) fn failing() -> Self {
        Self::new(Mode::Failing)
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribers(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }

    /// Notifies the subscribers that the session is gone.
    pub(crate) fn sign_out(&self) {
        _ = self.changes.send_replace(None);
    }
}

impl Handler<Select<CurrentSession>> for Sessions {
    type Ok = Option<Session>;
    type Err = String;

    async fn execute(
        &self,
        _: Select<CurrentSession>,
    ) -> Result<Self::Ok, Self::Err> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::AppearingAfter(absent) => Ok((read >= absent).then(session)),
            Mode::Absent => Ok(None),
            Mode::Failing => Err("connection refused".to_owned()),
        }
    }
}

impl SessionSource for Sessions {
    fn subscribe(&self) -> Subscription {
        _ = self.subscribers.fetch_add(1, Ordering::SeqCst);
        let subscribers = Arc::clone(&self.subscribers);
        Subscription::new(self.changes.subscribe(), move || {
            _ = subscribers.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

/// Record source serving a fixed set of records, counting its fetches.
#[derive(Clone, Debug)]
pub(crate) struct Stored {
    records: Arc<Vec<Record>>,
    fetches: Arc<AtomicUsize>,
}

impl Stored {
    pub(crate) fn with(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            records: Arc::new(ids.into_iter().map(record).collect()),
            fetches: Arc::default(),
        }
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Handler<Select<Scoped>> for Stored {
    type Ok = Records;
    type Err = String;

    async fn execute(
        &self,
        Select(scoped): Select<Scoped>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(match scoped.request {
            Request::List => {
                let total: u32 =
                    self.records.iter().map(|r| u32::from(r.score)).sum();
                let count = u32::try_from(self.records.len()).unwrap().max(1);
                Records::List {
                    records: self.records.to_vec(),
                    average_score: u8::try_from(total / count).unwrap(),
                }
            }
            Request::Detail(id) => Records::Detail {
                record: self
                    .records
                    .iter()
                    .find(|r| r.id == i64::from(id))
                    .cloned(),
            },
            Request::UnknownRecord => Records::Detail { record: None },
        })
    }
}

/// [`Navigator`] remembering the visited paths.
#[derive(Clone, Debug, Default)]
pub(crate) struct Navigation(Arc<Mutex<Vec<String>>>);

impl Navigation {
    pub(crate) fn visited(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Navigator for Navigation {
    fn replace(&self, path: &str) {
        self.0.lock().unwrap().push(path.to_owned());
    }
}
