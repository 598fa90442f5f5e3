pub use crate::utils::database;
use crate::{
    modules::{auth::authentication::Authenticators, geostory::endpoint::GeoStoryEndpoint},
    utils::pagination::PaginationPolicy,
};
use async_trait::async_trait;
use chrono::Duration;
use std::env;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthContext {
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    pub authenticators: Authenticators,
}

pub struct Context {
    pub app: AppContext,
    pub db: Arc<dyn database::Database>,
    pub auth: AuthContext,
    pub geostories: GeoStoryEndpoint,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub session_ttl: Duration,
    pub purge_interval_seconds: u64,
    pub admin: Option<AdminConfig>,
}

#[derive(Clone, Debug)]
pub struct PaginationConfig {
    pub page_size: u32,
    pub max_page_size: u32,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key} not set"),
            Self::Invalid(key, value) => write!(f, "Invalid value for {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let environment = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let port = parse_or::<u32>(&lookup, "PORT", 8000)?;
        let url = lookup("APP_URL").unwrap_or_else(|| format!("http://{}:{}", host, port));

        let session_ttl_seconds = parse_or::<i64>(&lookup, "SESSION_TTL_SECONDS", 1_209_600)?;
        let session_ttl = Duration::try_seconds(session_ttl_seconds)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                ConfigError::Invalid("SESSION_TTL_SECONDS", session_ttl_seconds.to_string())
            })?;
        let purge_interval_seconds = parse_or::<u64>(&lookup, "PURGE_INTERVAL_SECONDS", 3600)?;
        if purge_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "PURGE_INTERVAL_SECONDS",
                purge_interval_seconds.to_string(),
            ));
        }

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminConfig { username, password }),
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            _ => None,
        };

        let page_size = parse_or::<u32>(&lookup, "PAGE_SIZE", 10)?;
        let max_page_size = parse_or::<u32>(&lookup, "MAX_PAGE_SIZE", 100)?;
        if page_size == 0 || max_page_size < page_size {
            return Err(ConfigError::Invalid("PAGE_SIZE", page_size.to_string()));
        }

        Ok(Config {
            database: DatabaseConfig { url: database_url },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            auth: AuthConfig {
                session_ttl,
                purge_interval_seconds,
                admin,
            },
            pagination: PaginationConfig {
                page_size,
                max_page_size,
            },
        })
    }
}

impl Context {
    /// Assembles a context around an already opened store.
    pub fn new(config: &Config, db: Arc<dyn database::Database>) -> Self {
        Context {
            app: AppContext {
                host: config.app.host.clone(),
                environment: config.app.environment.clone(),
                port: config.app.port,
                url: config.app.url.clone(),
            },
            db,
            auth: AuthContext {
                session_ttl: config.auth.session_ttl,
                secure_cookies: config.app.environment == AppEnvironment::Production,
                authenticators: Authenticators::default(),
            },
            geostories: GeoStoryEndpoint::new(PaginationPolicy {
                default_page_size: config.pagination.page_size,
                max_page_size: config.pagination.max_page_size,
            }),
        }
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Result<Context, database::Error>;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Result<Context, database::Error> {
        let db = database::connect(self.database.url.as_str()).await?;
        Ok(Context::new(&self, db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "memory://")])).unwrap();

        assert_eq!(config.app.port, 8000);
        assert_eq!(config.app.url, "http://0.0.0.0:8000");
        assert_eq!(config.app.environment, AppEnvironment::Development);
        assert_eq!(config.auth.session_ttl, Duration::days(14));
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(config.pagination.max_page_size, 100);
        assert!(config.auth.admin.is_none());
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_URL not set");
    }

    #[test]
    fn admin_username_without_password_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("ADMIN_USERNAME", "root"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "ADMIN_PASSWORD not set");
    }

    #[test]
    fn page_size_larger_than_max_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("PAGE_SIZE", "50"),
            ("MAX_PAGE_SIZE", "20"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn session_ttl_must_be_a_positive_representable_duration() {
        for ttl in ["0".to_string(), "-5".to_string(), i64::MAX.to_string()] {
            let err = Config::from_lookup(lookup(&[
                ("DATABASE_URL", "memory://"),
                ("SESSION_TTL_SECONDS", ttl.as_str()),
            ]))
            .unwrap_err();

            assert_eq!(
                err.to_string(),
                format!("Invalid value for SESSION_TTL_SECONDS: {ttl:?}")
            );
        }

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("SESSION_TTL_SECONDS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.auth.session_ttl, Duration::minutes(1));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for PORT: \"eighty\"");
    }
}
