//! Fakes the [`Service`] is tested with.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::{
    operations::{By, Exchange, Refresh, Select},
    DateTime,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header};
use reqwest::StatusCode;
use tracerr::Traced;

use crate::{
    domain::{
        identity::{
            self,
            session::{AccessToken, Grant, RefreshToken, Tokens},
        },
        interview::{self, Metric, Metrics, OutOfRange, Score},
        InterviewRecord,
    },
    infra::{
        database, gotrue, identity as provider, postgres, Database,
        IdentityProvider,
    },
    read::interview::{list, Owned},
    Config, Service,
};

/// Secret the test [`AccessToken`]s are signed with.
const SECRET: &[u8] = b"interview-history-test-secret";

/// Audience of the test [`AccessToken`]s.
const AUDIENCE: &str = "authenticated";

/// Creates a [`Service`] over the provided fakes.
pub(crate) fn service(
    database: InMemory,
    provider: FakeProvider,
) -> Service<InMemory, FakeProvider> {
    Service::new(
        Config {
            jwt_decoding_key: DecodingKey::from_secret(SECRET),
            jwt_audience: AUDIENCE.to_owned(),
        },
        database,
        provider,
    )
}

/// Signs an [`AccessToken`] of the provided `owner` expiring in `ttl_secs`
/// (negative for an already expired one).
pub(crate) fn access_token(owner: identity::Id, ttl_secs: i64) -> AccessToken {
    signed(owner, ttl_secs, AUDIENCE)
}

/// Signs an [`AccessToken`] issued for a foreign audience.
pub(crate) fn foreign_access_token(owner: identity::Id) -> AccessToken {
    signed(owner, 3600, "somebody-else")
}

fn signed(owner: identity::Id, ttl_secs: i64, aud: &str) -> AccessToken {
    let claims = serde_json::json!({
        "sub": owner,
        "email": "taro@example.com",
        "exp": DateTime::now().unix_timestamp() + ttl_secs,
        "aud": aud,
        "app_metadata": {"provider": "google"},
    });
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap();
    AccessToken::new(token).unwrap()
}

/// Creates [`Tokens`] with a fresh [`AccessToken`] of the provided `owner`.
pub(crate) fn tokens(owner: identity::Id) -> Tokens {
    Tokens {
        access: access_token(owner, 3600),
        refresh: RefreshToken::new("refresh-me").unwrap(),
    }
}

/// Creates an [`InterviewRecord`] of the provided `owner`.
pub(crate) fn record(
    id: i64,
    owner: identity::Id,
    created_at: &str,
    score: i64,
) -> InterviewRecord {
    let metric = Metric::new(3.5).unwrap();
    InterviewRecord {
        id: interview::Id::new(id).unwrap(),
        owner_id: owner,
        created_at: DateTime::from_rfc3339(created_at).unwrap().coerce(),
        score: Score::new(score).unwrap(),
        strengths: "Concrete episodes".to_owned(),
        advice: "Slow down".to_owned(),
        comment: "Good overall".to_owned(),
        metrics: Metrics {
            voice_volume: metric,
            response_quality: metric,
            company_match: metric,
            episodes: metric,
            clarity: metric,
        },
    }
}

/// In-memory [`Database`] of [`InterviewRecord`]s.
#[derive(Clone, Debug, Default)]
pub(crate) struct InMemory {
    /// Stored [`InterviewRecord`]s, in no particular order.
    pub(crate) records: Vec<InterviewRecord>,

    /// Whether every operation fails.
    pub(crate) failing: bool,
}

impl InMemory {
    fn check(&self) -> Result<(), Traced<database::Error>> {
        if self.failing {
            return Err(tracerr::new!(database::Error::from(
                postgres::Error::InvalidRow(OutOfRange("score")),
            )));
        }
        Ok(())
    }
}

impl Database<Select<By<Vec<InterviewRecord>, list::Selector>>> for InMemory {
    type Ok = Vec<InterviewRecord>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<InterviewRecord>, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check()?;
        let list::Selector { owner, limit } = by.into_inner();

        let mut records = self
            .records
            .iter()
            .filter(|r| r.owner_id == owner)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit.into());
        Ok(records)
    }
}

impl Database<Select<By<Option<InterviewRecord>, Owned>>> for InMemory {
    type Ok = Option<InterviewRecord>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<InterviewRecord>, Owned>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check()?;
        let Owned { owner, id } = by.into_inner();

        Ok(self
            .records
            .iter()
            .find(|r| r.owner_id == owner && r.id == id)
            .cloned())
    }
}

/// Scripted [`IdentityProvider`].
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeProvider {
    /// [`Tokens`] issued on a successful [`Exchange`], rejects otherwise.
    pub(crate) exchanged: Option<Tokens>,

    /// [`Tokens`] issued on a successful [`Refresh`], rejects otherwise.
    pub(crate) refreshed: Option<Tokens>,

    /// Number of performed [`Refresh`]es.
    pub(crate) refreshes: Arc<AtomicUsize>,
}

impl FakeProvider {
    fn reply(
        tokens: Option<&Tokens>,
    ) -> Result<Tokens, Traced<provider::Error>> {
        tokens.cloned().ok_or_else(|| {
            tracerr::new!(provider::Error::from(gotrue::Error::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: "invalid grant".to_owned(),
            }))
        })
    }
}

impl IdentityProvider<Exchange<Grant>> for FakeProvider {
    type Ok = Tokens;
    type Err = Traced<provider::Error>;

    async fn execute(&self, _: Exchange<Grant>) -> Result<Self::Ok, Self::Err> {
        Self::reply(self.exchanged.as_ref())
    }
}

impl IdentityProvider<Refresh<RefreshToken>> for FakeProvider {
    type Ok = Tokens;
    type Err = Traced<provider::Error>;

    async fn execute(
        &self,
        _: Refresh<RefreshToken>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.refreshes.fetch_add(1, Ordering::SeqCst);
        Self::reply(self.refreshed.as_ref())
    }
}
