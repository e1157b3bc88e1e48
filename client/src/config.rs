//! Client [`Config`] definitions.

use std::time::Duration;

use serde::Deserialize;
use smart_default::SmartDefault;

/// Client configuration, usually found under the `client` key.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    /// Base URL of the application.
    #[default("http://127.0.0.1:8080".to_owned())]
    pub base_url: String,

    /// Number of session reads retried before giving up.
    #[default(5)]
    pub attempts: u32,

    /// Delay between session reads.
    #[default(Duration::from_millis(300))]
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,

    /// Period of re-reading the session while its changes are watched.
    #[default(Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub recheck: Duration,

    /// Path to navigate to once the session is gone.
    #[default("/login".to_owned())]
    pub login_path: String,

    /// Path of the session endpoint.
    #[default("/auth/session".to_owned())]
    pub session_path: String,

    /// Path of the interview records endpoint.
    #[default("/mypage/records".to_owned())]
    pub records_path: String,
}
