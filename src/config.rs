use actix_cors::Cors;
use std::env;
use std::fmt;

use crate::error::BootstrapError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;

/// Explicit set of origins allowed to make credentialed cross-origin requests.
///
/// Credentials are always allowed, so the wildcard origin is rejected here
/// rather than being silently narrowed by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    pub fn new<I, S>(origins: I) -> Result<Self, BootstrapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for origin in origins {
            let origin = origin.into().trim().trim_end_matches('/').to_string();
            if origin.is_empty() {
                continue;
            }
            if origin == "*" {
                return Err(BootstrapError::ConfigurationUnavailable(
                    "wildcard origin cannot be combined with credentialed CORS".into(),
                ));
            }
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(BootstrapError::ConfigurationUnavailable(format!(
                    "allowed origin '{}' must include an http(s) scheme",
                    origin
                )));
            }
            if !list.contains(&origin) {
                list.push(origin);
            }
        }

        if list.is_empty() {
            return Err(BootstrapError::ConfigurationUnavailable(
                "at least one allowed origin is required".into(),
            ));
        }
        Ok(Self(list))
    }

    /// Parses a comma separated list, e.g. `http://localhost:3000,https://app.example.com`.
    pub fn parse(raw: &str) -> Result<Self, BootstrapError> {
        Self::new(raw.split(','))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Builds the CORS policy: listed origins only, any method, any header,
    /// credentials allowed.
    pub fn cors(&self) -> Cors {
        self.0
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600)
    }
}

/// Process-wide settings, loaded once at start-up and never mutated.
#[derive(Clone)]
pub struct Settings {
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub allowed_origins: AllowedOrigins,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub workers: Option<usize>,
}

impl Settings {
    /// Settings with every optional value at its default.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            debug: false,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: AllowedOrigins(vec![DEFAULT_ORIGINS.to_string()]),
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            workers: None,
        }
    }

    /// Loads settings from the process environment. The binary loads `.env`
    /// into the environment before calling this.
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BootstrapError::ConfigurationUnavailable(format!("{} must be set", key)))
        };

        let debug = match lookup("DEBUG") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                BootstrapError::ConfigurationUnavailable(format!("DEBUG must be a boolean, got '{}'", raw))
            })?,
            None => false,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                BootstrapError::ConfigurationUnavailable(format!("PORT must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let jwt_expiration_hours = match lookup("JWT_EXPIRATION_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| {
                    BootstrapError::ConfigurationUnavailable(format!(
                        "JWT_EXPIRATION_HOURS must be a positive number, got '{}'",
                        raw
                    ))
                })?,
            None => DEFAULT_JWT_EXPIRATION_HOURS,
        };

        let workers = match lookup("WORKERS") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        BootstrapError::ConfigurationUnavailable(format!(
                            "WORKERS must be a positive number, got '{}'",
                            raw
                        ))
                    })?,
            ),
            None => None,
        };

        let allowed_origins =
            AllowedOrigins::parse(&lookup("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ORIGINS.into()))?;

        Ok(Self {
            debug,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            allowed_origins,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours,
            workers,
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("debug", &self.debug)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("workers", &self.workers)
            .finish()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
