use std::{
    future::IntoFuture as _, io, net::SocketAddr, sync::OnceLock, time,
};

use application::{config, gate, session, Args, Config};
use axum::extract::MatchedPath;
use axum_client_ip::InsecureClientIp;
use service::{
    infra::{postgres, GoTrue, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr`, everything else goes to `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level of the emitted events, set once the config is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(output(io::stdout, false))
        .with(output(io::stderr, true))
        .init();

    _ = start().await;
}

/// Builds a compact log output into the provided `writer`, accepting either
/// the [`STDERR_LEVELS`] or the rest of them.
fn output<S, W>(writer: W, stderr: bool) -> impl Layer<S> + Send + Sync
where
    S: log::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == stderr
                    && max >= *meta.level()
        }))
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        routes,
        cookie,
        provider,
        postgres,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let routes = gate::Routes::try_from(routes).map_err(|e| {
        log::error!("invalid routes configuration: {e}");
    })?;
    let store = session::Store::from(cookie);

    let (service_config, gotrue_config) = provider.split().map_err(|e| {
        log::error!("invalid identity provider configuration: {e}");
    })?;
    let gotrue = GoTrue::new(gotrue_config).map_err(|e| {
        log::error!("failed to initialize `GoTrue` client: {e}");
    })?;

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    let report = migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;
    for migration in report.applied_migrations() {
        log::info!("applied migration `{migration}`");
    }

    let app = application::app(
        Service::new(service_config, postgres, gotrue),
        routes,
        store,
    )
    .layer(cors(&server.cors)?)
    .layer(
        TraceLayer::new_for_http()
            .make_span_with(|r: &http::Request<_>| {
                let headers = r.headers();
                tracing::info_span!(
                    "HTTP request",
                    http.client_ip =
                        InsecureClientIp::from(headers, r.extensions())
                            .map(|ip| ip.0.to_string())
                            .ok(),
                    http.method = r.method().as_str(),
                    http.route = r
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str),
                    http.target = r.uri().path(),
                    http.user_agent = headers
                        .get(http::header::USER_AGENT)
                        .and_then(|h| h.to_str().ok()),
                    http.status_code = tracing::field::Empty,
                )
            })
            .on_response(
                |r: &http::Response<_>,
                 elapsed: time::Duration,
                 span: &tracing::Span| {
                    let status = r.status();
                    _ = span.record("http.status_code", status.as_u16());
                    let elapsed = format!("{}ms", elapsed.as_millis());
                    if status.is_server_error() {
                        log::error!(duration = elapsed);
                    } else {
                        log::info!(duration = elapsed);
                    }
                },
            ),
    );

    let addr = (server.host.as_str(), server.port);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        log::error!("failed to listen on `{}:{}`: {e}", addr.0, addr.1);
    })?;
    log::info!("listening on `{}:{}`", addr.0, addr.1);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .into_future()
    .await
    .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Builds the [`CorsLayer`] allowing the configured origins to read the API.
///
/// A `*` among the origins allows any of them.
fn cors(config: &config::Cors) -> Result<CorsLayer, ()> {
    let origins = if config.origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .origins
                .iter()
                .map(|origin| {
                    origin.parse::<http::HeaderValue>().map_err(|e| {
                        log::error!("`{origin}` is not a valid CORS origin: {e}");
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };
    Ok(CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(origins))
}
