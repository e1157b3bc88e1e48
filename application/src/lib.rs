//! Application serves the session gate and the interview records API of
//! the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;
pub mod gate;
pub mod session;

use std::sync::Arc;

use axum::{middleware, Extension, Router};
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::Context,
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service =
    service::Service<service::infra::Postgres, service::infra::GoTrue>;

/// Builds the application [`Router`] serving the HTTP API behind the
/// [`gate`].
pub fn app(
    service: Service,
    routes: gate::Routes,
    store: session::Store,
) -> Router {
    gated(api::router(&routes), service, routes, store)
}

/// Puts the provided `router` behind the [`gate`], and provides it with the
/// dependencies its handlers extract.
pub fn gated(
    router: Router,
    service: Service,
    routes: gate::Routes,
    store: session::Store,
) -> Router {
    router
        .layer(middleware::from_fn(gate::enforce))
        .layer(Extension(Arc::new(routes)))
        .layer(Extension(Arc::new(store)))
        .layer(Extension(service))
}

#[cfg(test)]
mod test_support;
