//! Client runtime of the interview history page.
//!
//! Waits for the session to materialize after the sign-in redirect, then
//! loads the interview records of the signed-in identity.

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

pub mod config;
pub mod http;
pub mod model;
pub mod readiness;
pub mod source;
pub mod view;

#[cfg(test)]
mod test_support;

pub use self::{
    config::Config,
    http::Http,
    source::{RecordSource, SessionSource, Subscription},
    view::{MyPage, Navigator},
};
