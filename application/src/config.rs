//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use service::{
    domain::route,
    infra::gotrue::{self, Url},
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Routes configuration.
    pub routes: Routes,

    /// Session cookies configuration.
    pub cookie: Cookie,

    /// Identity provider configuration.
    pub provider: Provider,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Routes configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Routes {
    /// Path of the login entry point.
    #[default("/login".to_owned())]
    pub login: String,

    /// Path to land on after signing in, unless asked otherwise.
    #[default("/mypage".to_owned())]
    pub landing: String,

    /// Prefix of the subtree requiring a session.
    #[default("/mypage".to_owned())]
    pub protected: String,
}

impl TryFrom<Routes> for crate::gate::Routes {
    type Error = InvalidRoute;

    fn try_from(value: Routes) -> Result<Self, Self::Error> {
        let Routes {
            login,
            landing,
            protected,
        } = value;

        let parse = |path: String| {
            route::Path::new(path.clone()).ok_or(InvalidRoute::Foreign(path))
        };
        let login = parse(login)?;
        let protected = route::Prefix::new(parse(protected)?);
        if protected.covers(login.as_ref()) {
            return Err(InvalidRoute::GuardedLogin {
                login: login.to_string(),
                protected: protected.to_string(),
            });
        }

        Ok(Self {
            login,
            landing: parse(landing)?,
            protected,
        })
    }
}

/// Error of the configured routes the gate cannot rely on.
#[derive(Clone, Debug, Display, Error)]
pub enum InvalidRoute {
    /// Route is not a same-origin path.
    #[display("`{_0}` is not a same-origin path")]
    Foreign(#[error(not(source))] String),

    /// Login path requires a session itself, so denied requests would be
    /// redirected endlessly.
    #[display("login path `{login}` lies inside the `{protected}` subtree")]
    GuardedLogin {
        /// Configured login path.
        login: String,

        /// Configured protected prefix.
        protected: String,
    },
}

/// Session cookies configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cookie {
    /// Prefix of the session cookie names.
    #[default("session".to_owned())]
    pub prefix: String,

    /// Whether the cookies are sent over HTTPS only.
    #[default(true)]
    pub secure: bool,

    /// Lifetime of the refresh token cookie.
    #[default(time::Duration::from_secs(60 * 60 * 24 * 30))]
    #[serde(with = "humantime_serde")]
    pub refresh_max_age: time::Duration,
}

impl From<Cookie> for crate::session::Store {
    fn from(value: Cookie) -> Self {
        let Cookie {
            prefix,
            secure,
            refresh_max_age,
        } = value;
        Self::new(&prefix, secure, refresh_max_age)
    }
}

/// Identity provider configuration.
#[derive(Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Provider {
    /// Base URL of the GoTrue-compatible auth server.
    #[default("http://127.0.0.1:9999".to_owned())]
    pub url: String,

    /// Public API key of the auth server.
    #[default(SecretString::from(""))]
    pub api_key: SecretString,

    /// [JWT] secret the access tokens are signed with.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(SecretString::from("secret"))]
    pub jwt_secret: SecretString,

    /// Audience the access tokens are issued for.
    #[default("authenticated".to_owned())]
    pub audience: String,
}

impl Provider {
    /// Splits this [`Provider`] configuration into the [`service::Config`]
    /// and the [`gotrue::Config`].
    ///
    /// # Errors
    ///
    /// If the configured `url` is malformed.
    pub fn split(
        self,
    ) -> Result<(service::Config, gotrue::Config), InvalidProviderUrl> {
        let Self {
            url,
            api_key,
            jwt_secret,
            audience,
        } = self;

        let url = Url::parse(&url).map_err(|_| InvalidProviderUrl(url))?;
        Ok((
            service::Config {
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    jwt_secret.expose_secret().as_bytes(),
                ),
                jwt_audience: audience,
            },
            gotrue::Config { url, api_key },
        ))
    }
}

/// Error of a malformed identity provider URL.
#[derive(Clone, Debug, Display, Error)]
#[display("`{_0}` is not a valid URL")]
pub struct InvalidProviderUrl(#[error(not(source))] pub String);

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::gate;

    use super::{Config, InvalidRoute, Routes};

    #[test]
    fn defaults_to_mypage_subtree() {
        let config = Config::new("does-not-exist.toml").unwrap();

        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.protected, "/mypage");
        assert_eq!(config.cookie.prefix, "session");
        assert_eq!(
            config.cookie.refresh_max_age,
            Duration::from_secs(60 * 60 * 24 * 30),
        );
        assert_eq!(config.provider.audience, "authenticated");
    }

    #[test]
    fn rejects_foreign_routes() {
        let routes = Routes {
            login: "https://evil.example/login".to_owned(),
            ..Routes::default()
        };

        assert!(matches!(
            gate::Routes::try_from(routes),
            Err(InvalidRoute::Foreign(_)),
        ));
    }

    #[test]
    fn rejects_login_inside_protected_subtree() {
        for login in ["/mypage/login", "/mypage"] {
            let routes = Routes {
                login: login.to_owned(),
                ..Routes::default()
            };

            assert!(
                matches!(
                    gate::Routes::try_from(routes),
                    Err(InvalidRoute::GuardedLogin { .. }),
                ),
                "{login}",
            );
        }

        let routes = Routes {
            login: "/mypages/login".to_owned(),
            ..Routes::default()
        };
        assert!(gate::Routes::try_from(routes).is_ok());
    }
}
