//! HTTP implementation of the client sources, backed by the application API.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use common::{operations::Select, Handler};
use derive_more::{Display, Error as StdError, From};
use reqwest::{redirect, StatusCode, Url};
use service::read::interview::Request;
use tokio::{runtime, sync::watch, task, time};
use tracerr::Traced;
use tracing as log;

use crate::{
    model::{Records, Session},
    source::{CurrentSession, Scoped, SessionSource, Subscription},
    Config,
};

/// Client of the application HTTP API.
///
/// Keeps the session cookies in its own cookie store, and notifies the
/// [`Subscription`]s whenever a read session differs from the previous one.
/// While anyone is subscribed, the session is re-read periodically and once
/// it expires, so its loss is noticed without any reads on the caller's side.
#[derive(Clone, Debug)]
pub struct Http {
    /// HTTP client performing the requests.
    client: reqwest::Client,

    /// URL of the session endpoint.
    session_url: Url,

    /// URL of the interview records endpoint.
    records_url: Url,

    /// Period of re-reading the session while subscribed.
    recheck: Duration,

    /// Last read [`Session`].
    changes: Arc<watch::Sender<Option<Session>>>,

    /// Subscribers of the [`Session`] changes and their re-reading task.
    watch: Arc<Mutex<Watch>>,
}

/// Re-reading of the [`Session`] on behalf of its subscribers.
#[derive(Debug, Default)]
struct Watch {
    /// Number of the active [`Subscription`]s.
    subscribers: usize,

    /// Task re-reading the [`Session`], if running.
    task: Option<task::AbortHandle>,
}

impl Watch {
    /// Locks the provided [`Watch`].
    fn lock(watch: &Mutex<Self>) -> MutexGuard<'_, Self> {
        watch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Http {
    /// Creates a new [`Http`] client out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the configured URLs are malformed or the HTTP client cannot be
    /// built.
    pub fn new(config: &Config) -> Result<Self, Traced<Error>> {
        let url = |path: &str| {
            let raw =
                format!("{}{path}", config.base_url.trim_end_matches('/'));
            Url::parse(&raw)
                .map_err(|_| tracerr::new!(Error::InvalidUrl(raw)))
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self {
            client,
            session_url: url(&config.session_path)?,
            records_url: url(&config.records_path)?,
            recheck: config.recheck,
            changes: Arc::new(watch::channel(None).0),
            watch: Arc::default(),
        })
    }

    /// Returns the number of the active [`Subscription`]s.
    #[must_use]
    pub fn subscribers(&self) -> usize {
        Watch::lock(&self.watch).subscribers
    }

    /// Reads the current [`Session`] and announces it.
    async fn read_session(&self) -> Result<Option<Session>, Traced<Error>> {
        let resp = self
            .client
            .get(self.session_url.clone())
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let session = match resp.status() {
            StatusCode::UNAUTHORIZED => None,
            status if status.is_success() => Some(
                resp.json::<Session>()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> Error))?,
            ),
            status => return Err(tracerr::new!(Error::Status(status))),
        };
        self.announce(session.clone());
        Ok(session)
    }

    /// Notifies the [`Subscription`]s about the provided `session`, if it
    /// differs from the last one.
    fn announce(&self, session: Option<Session>) {
        _ = self.changes.send_if_modified(|current| {
            let modified = *current != session;
            if modified {
                log::debug!(
                    "session changed, notifying {} subscriber(s)",
                    self.subscribers(),
                );
                *current = session;
            }
            modified
        });
    }

    /// Re-reads the [`Session`] every [`Config::recheck`] period, or sooner
    /// if it expires before.
    async fn recheck(self) {
        loop {
            let delay = self
                .changes
                .borrow()
                .as_ref()
                .and_then(|s| s.expires_at.remaining())
                .map_or(self.recheck, |left| left.min(self.recheck));
            time::sleep(delay).await;

            if let Err(e) = self.read_session().await {
                log::warn!("failed to re-read session: {e}");
            }
        }
    }
}

impl Handler<Select<CurrentSession>> for Http {
    type Ok = Option<Session>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        _: Select<CurrentSession>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read_session().await.map_err(tracerr::wrap!())
    }
}

impl SessionSource for Http {
    /// Subscribes to the [`Session`] changes, starting to re-read it if
    /// nobody has been subscribed yet.
    ///
    /// Outside of a [Tokio] runtime only the reads made by callers are
    /// announced.
    ///
    /// [Tokio]: tokio
    fn subscribe(&self) -> Subscription {
        let mut watch = Watch::lock(&self.watch);
        watch.subscribers += 1;
        if watch.task.is_none() {
            match runtime::Handle::try_current() {
                Ok(rt) => {
                    let task = rt.spawn(self.clone().recheck());
                    watch.task = Some(task.abort_handle());
                }
                Err(e) => log::warn!("session is not re-read: {e}"),
            }
        }
        drop(watch);

        let shared = Arc::clone(&self.watch);
        Subscription::new(self.changes.subscribe(), move || {
            let mut watch = Watch::lock(&shared);
            watch.subscribers = watch.subscribers.saturating_sub(1);
            if watch.subscribers == 0 {
                if let Some(task) = watch.task.take() {
                    task.abort();
                }
            }
        })
    }
}

impl Handler<Select<Scoped>> for Http {
    type Ok = Records;
    type Err = Traced<Error>;

    /// Reads the interview [`Records`].
    ///
    /// Being denied by the application means the session is gone, which is
    /// announced to the [`Subscription`]s.
    async fn execute(
        &self,
        Select(Scoped { session, request }): Select<Scoped>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = match request {
            Request::List => None,
            Request::Detail(id) => Some(i64::from(id).to_string()),
            Request::UnknownRecord => Some(String::new()),
        };
        let mut req = self.client.get(self.records_url.clone());
        if let Some(id) = id {
            req = req.query(&[("view", Request::DETAIL_VIEW), ("id", &id)]);
        }

        log::debug!(
            "reading {request:?} of `{}` interview records",
            session.identity_id,
        );
        let resp = req
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status.is_redirection() {
            self.announce(None);
        }
        if !status.is_success() {
            return Err(tracerr::new!(Error::Status(status)));
        }
        resp.json()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}

/// [`Http`] client error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Request failed to complete.
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// Application answered with an unexpected [`StatusCode`], like a
    /// redirect to the login path once the session is gone.
    #[display("unexpected `{_0}` response")]
    #[from(ignore)]
    Status(#[error(not(source))] StatusCode),

    /// Configured URL is malformed.
    #[display("invalid URL: `{_0}`")]
    #[from(ignore)]
    InvalidUrl(#[error(not(source))] String),
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    };

    use axum::{
        extract::{Query, State},
        http::{header, StatusCode},
        response::{IntoResponse as _, Response},
        routing::get,
        Json, Router,
    };
    use common::{operations::Select, Handler as _};
    use serde_json::json;
    use service::read::interview::Request;
    use tokio::{net::TcpListener, time};

    use crate::{
        model::Records,
        source::{CurrentSession, Scoped, SessionSource as _},
        test_support::{session, Navigation},
        Config, MyPage,
    };

    use super::{Error, Http};

    fn record(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "created_at": "2024-05-01T09:30:00Z",
            "score": 70,
            "strengths": "Calm",
            "advice": "Be concise",
            "comment": "Good",
            "metrics": {
                "voice_volume": 4,
                "response_quality": 3,
                "company_match": 2,
                "episodes": 5,
                "clarity": 4,
            },
        })
    }

    async fn session_endpoint(
        State(signed_in): State<Arc<AtomicBool>>,
    ) -> Response {
        if !signed_in.load(Ordering::SeqCst) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": "AUTHORIZATION_REQUIRED"})),
            )
                .into_response();
        }
        Json(json!({
            "identity_id": "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7",
            "email": "taro@example.com",
            "expires_at": "2030-03-17T17:46:40Z",
            "provider": "google",
        }))
        .into_response()
    }

    async fn records_endpoint(
        State(signed_in): State<Arc<AtomicBool>>,
        Query(params): Query<Vec<(String, String)>>,
    ) -> Response {
        if !signed_in.load(Ordering::SeqCst) {
            return (
                StatusCode::FOUND,
                [(header::LOCATION, "/login")],
            )
                .into_response();
        }
        let id = params
            .iter()
            .find(|(k, _)| k == "id")
            .and_then(|(_, v)| v.parse::<i64>().ok());
        match id {
            Some(2) => Json(json!({"view": "detail", "record": record(2)}))
                .into_response(),
            Some(_) => {
                Json(json!({"view": "detail", "record": null})).into_response()
            }
            None if params.is_empty() => Json(json!({
                "view": "list",
                "records": [record(2), record(1)],
                "average_score": 70,
            }))
            .into_response(),
            None => {
                Json(json!({"view": "detail", "record": null})).into_response()
            }
        }
    }

    /// Spawns the application API and returns its base URL along with the
    /// switch of its session.
    async fn spawn_app() -> (String, Arc<AtomicBool>) {
        let signed_in = Arc::new(AtomicBool::new(false));
        let app = Router::new()
            .route("/auth/session", get(session_endpoint))
            .route("/mypage/records", get(records_endpoint))
            .with_state(Arc::clone(&signed_in));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        }));
        (format!("http://{addr}/"), signed_in)
    }

    async fn client() -> (Http, Arc<AtomicBool>) {
        let (base_url, signed_in) = spawn_app().await;
        let http = Http::new(&Config {
            base_url,
            ..Config::default()
        })
        .unwrap();
        (http, signed_in)
    }

    #[tokio::test]
    async fn reads_session() {
        let (http, signed_in) = client().await;

        assert_eq!(http.execute(Select(CurrentSession)).await.unwrap(), None);

        signed_in.store(true, Ordering::SeqCst);
        assert_eq!(
            http.execute(Select(CurrentSession)).await.unwrap(),
            Some(session()),
        );
    }

    #[tokio::test]
    async fn notifies_about_session_changes() {
        let (http, signed_in) = client().await;
        let mut subscription = http.subscribe();
        assert_eq!(http.subscribers(), 1);

        _ = http.execute(Select(CurrentSession)).await.unwrap();
        signed_in.store(true, Ordering::SeqCst);
        _ = http.execute(Select(CurrentSession)).await.unwrap();
        assert!(subscription.changed().await.unwrap().is_some());

        signed_in.store(false, Ordering::SeqCst);
        _ = http.execute(Select(CurrentSession)).await.unwrap();
        assert_eq!(subscription.changed().await, Some(None));

        drop(subscription);
        assert_eq!(http.subscribers(), 0);
    }

    #[tokio::test]
    async fn reads_records() {
        let (http, signed_in) = client().await;
        signed_in.store(true, Ordering::SeqCst);

        let list = http
            .execute(Select(Scoped {
                session: session(),
                request: Request::List,
            }))
            .await
            .unwrap();
        let Records::List {
            records,
            average_score,
        } = list
        else {
            panic!("expected list view");
        };
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), [2, 1]);
        assert_eq!(average_score, 70);

        let detail = http
            .execute(Select(Scoped {
                session: session(),
                request: Request::from_params(Some("detail"), Some("2")),
            }))
            .await
            .unwrap();
        assert!(matches!(
            detail,
            Records::Detail { record: Some(r) } if r.id == 2,
        ));

        let missing = http
            .execute(Select(Scoped {
                session: session(),
                request: Request::UnknownRecord,
            }))
            .await
            .unwrap();
        assert_eq!(missing, Records::Detail { record: None });
    }

    #[tokio::test]
    async fn fails_on_redirect_to_login() {
        let (http, _) = client().await;

        let err = http
            .execute(Select(Scoped {
                session: session(),
                request: Request::List,
            }))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            Error::Status(s) if *s == StatusCode::FOUND,
        ));
    }

    #[test]
    fn rejects_malformed_base_url() {
        let err = Http::new(&Config {
            base_url: "not a url".to_owned(),
            ..Config::default()
        })
        .unwrap_err();

        assert!(matches!(err.as_ref(), Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn forgets_session_denied_by_records() {
        let (http, signed_in) = client().await;
        let mut subscription = http.subscribe();
        signed_in.store(true, Ordering::SeqCst);
        _ = http.execute(Select(CurrentSession)).await.unwrap();
        assert!(subscription.changed().await.unwrap().is_some());

        signed_in.store(false, Ordering::SeqCst);
        let denied = http
            .execute(Select(Scoped {
                session: session(),
                request: Request::List,
            }))
            .await;

        assert!(denied.is_err());
        assert_eq!(subscription.changed().await, Some(None));
    }

    #[tokio::test]
    async fn leaves_page_once_signed_out_on_server() {
        let (base_url, signed_in) = spawn_app().await;
        signed_in.store(true, Ordering::SeqCst);
        let config = Config {
            base_url,
            recheck: Duration::from_millis(100),
            ..Config::default()
        };
        let http = Http::new(&config).unwrap();
        let navigation = Navigation::default();

        let (handle, task) = MyPage::new(
            http.clone(),
            http.clone(),
            navigation.clone(),
            config,
            (None, None),
        )
        .mount();
        let running = tokio::spawn(task);
        let mut changes = handle.changes();
        let loaded = time::timeout(
            Duration::from_secs(5),
            changes.wait_for(|s| !s.loading),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(loaded.records.len(), 2);
        assert!(navigation.visited().is_empty());
        assert_eq!(http.subscribers(), 1);

        signed_in.store(false, Ordering::SeqCst);
        time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(navigation.visited(), ["/login"]);
        assert!(handle.state().records.is_empty());
        assert_eq!(http.subscribers(), 0);
    }
}
