//! Application wired to an in-process identity provider for tests.

use std::time::Duration;

use axum::{
    body::Body,
    extract::Query,
    response::{IntoResponse as _, Response},
    routing::{get, post},
    Json, Router,
};
use common::DateTime;
use jsonwebtoken::{EncodingKey, Header};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use service::infra::{GoTrue, Postgres};
use tokio::net::TcpListener;
use tower::ServiceExt as _;

use crate::{api, config, gate, gated, session, Service};

/// Secret the identity provider signs access tokens with.
const SECRET: &str = "gate-test-secret";

/// ID of the identity the provider signs everybody in as.
pub(crate) const OWNER: &str = "6f1c1f44-0c64-4d65-8a4c-0b1b0bb4a0a7";

/// Authorization code the provider accepts.
pub(crate) const GOOD_CODE: &str = "good-code";

/// Refresh token the provider accepts.
pub(crate) const GOOD_REFRESH: &str = "good-refresh";

/// Refresh token the provider issues.
pub(crate) const ISSUED_REFRESH: &str = "issued-refresh";

/// Signs an access token of [`OWNER`] expiring in `ttl_secs`.
pub(crate) fn access_token(ttl_secs: i64) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &json!({
            "sub": OWNER,
            "email": "taro@example.com",
            "exp": DateTime::now().unix_timestamp() + ttl_secs,
            "aud": "authenticated",
            "app_metadata": {"provider": "google"},
        }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

#[derive(Deserialize)]
struct GrantType {
    grant_type: String,
}

async fn token(
    Query(GrantType { grant_type }): Query<GrantType>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let accepted = match grant_type.as_str() {
        "pkce" => body["auth_code"] == GOOD_CODE,
        "refresh_token" => body["refresh_token"] == GOOD_REFRESH,
        _ => false,
    };
    if !accepted {
        return (
            http::StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid grant",
            })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": access_token(3600),
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": ISSUED_REFRESH,
    }))
    .into_response()
}

/// Spawns the identity provider and returns its base URL.
async fn spawn_provider() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(tokio::spawn(async move {
        axum::serve(listener, Router::new().route("/token", post(token)))
            .await
            .unwrap();
    }));
    format!("http://{addr}")
}

/// Builds the application with an extra `/mypage/ping` route answering
/// `pong`.
pub(crate) async fn app() -> Router {
    let (service_config, gotrue_config) = config::Provider {
        url: spawn_provider().await,
        jwt_secret: SecretString::from(SECRET),
        ..config::Provider::default()
    }
    .split()
    .unwrap();
    let service = Service::new(
        service_config,
        Postgres::new(&config::Postgres::default().into()).unwrap(),
        GoTrue::new(gotrue_config).unwrap(),
    );
    let routes = gate::Routes::try_from(config::Routes::default()).unwrap();
    let store = session::Store::new("session", false, Duration::from_secs(60));

    gated(
        api::router(&routes).route("/mypage/ping", get(|| async { "pong" })),
        service,
        routes,
        store,
    )
}

/// Performs a `GET` request with the provided `cookies`.
pub(crate) async fn get_with(
    app: &Router,
    uri: &str,
    cookies: &[(&str, &str)],
) -> Response {
    let mut req = http::Request::get(uri);
    if !cookies.is_empty() {
        let cookies = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        req = req.header(http::header::COOKIE, cookies);
    }
    app.clone().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

/// Returns the `Location` of the provided redirect [`Response`].
pub(crate) fn location(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(http::header::LOCATION)
        .and_then(|h| h.to_str().ok())
}

/// Returns the `Set-Cookie` headers of the provided [`Response`].
pub(crate) fn set_cookies(resp: &Response) -> Vec<String> {
    resp.headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok().map(ToOwned::to_owned))
        .collect()
}

/// Reads the whole body of the provided [`Response`].
pub(crate) async fn body(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
