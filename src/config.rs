use std::env;
use std::net::SocketAddr;

use tracing::{info, warn};

use crate::feed::{DEFAULT_FEED_URL, DEFAULT_NEWS_FEEDS};
use crate::translate::ProviderEndpoints;
use crate::weather::{OPEN_METEO_AIR_URL, OPEN_METEO_URL};

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_ADMIN_USERNAME: &str = "admin";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: invalid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        source: url::ParseError,
    },

    #[error("{key}: URL must be HTTP(S)")]
    InvalidScheme { key: &'static str },

    #[error("{key}: invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Startup configuration, read once from the environment.
///
/// - `DEARKOCHI_BIND`: listen address (default `0.0.0.0:3000`)
/// - `MANORAMA_FEED_URL`: RSS feed behind `/api/manorama-news`
/// - `NEWS_FEEDS`: comma-separated feeds merged by `/api/News`
/// - `LIBRETRANSLATE_URL`, `MYMEMORY_URL`, `GOOGLE_TRANSLATE_URL`: provider base URLs
/// - `OPEN_METEO_URL`, `OPEN_METEO_AIR_URL`: weather base URLs
/// - `ADMIN_USERNAME` (default `admin`), `ADMIN_PASSWORD_HASH` (Argon2 PHC string)
/// - `MAINTENANCE_MODE`: `true`/`false` (default `false`)
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub feed_url: String,
    pub news_feeds: Vec<String>,
    pub translation: ProviderEndpoints,
    pub forecast_url: String,
    pub air_quality_url: String,
    pub admin_username: String,
    pub admin_password_hash: Option<String>,
    pub maintenance_mode: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let url_or = |key: &'static str, default: &str| -> Result<String, ConfigError> {
            match var(key) {
                Some(value) => validate_url(key, &value).map(|()| value),
                None => Ok(default.to_string()),
            }
        };

        let bind_raw = var("DEARKOCHI_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "DEARKOCHI_BIND",
                value: bind_raw.clone(),
            })?;

        let maintenance_mode = match var("MAINTENANCE_MODE").as_deref() {
            None => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                return Err(ConfigError::InvalidValue {
                    key: "MAINTENANCE_MODE",
                    value: v.to_string(),
                });
            }
        };

        let admin_password_hash = var("ADMIN_PASSWORD_HASH");
        if admin_password_hash.is_none() {
            warn!("ADMIN_PASSWORD_HASH not set, admin login is disabled");
        }

        let news_feeds = match var("NEWS_FEEDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(|url| validate_url("NEWS_FEEDS", url).map(|()| url.to_string()))
                .collect::<Result<Vec<_>, _>>()?,
            None => DEFAULT_NEWS_FEEDS.iter().map(|url| url.to_string()).collect(),
        };

        let defaults = ProviderEndpoints::default();
        let config = Self {
            bind,
            feed_url: url_or("MANORAMA_FEED_URL", DEFAULT_FEED_URL)?,
            news_feeds,
            translation: ProviderEndpoints {
                libretranslate: url_or("LIBRETRANSLATE_URL", &defaults.libretranslate)?,
                mymemory: url_or("MYMEMORY_URL", &defaults.mymemory)?,
                google: url_or("GOOGLE_TRANSLATE_URL", &defaults.google)?,
            },
            forecast_url: url_or("OPEN_METEO_URL", OPEN_METEO_URL)?,
            air_quality_url: url_or("OPEN_METEO_AIR_URL", OPEN_METEO_AIR_URL)?,
            admin_username: var("ADMIN_USERNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password_hash,
            maintenance_mode,
        };

        info!(bind = %config.bind, feed = %config.feed_url, maintenance = config.maintenance_mode, "configuration loaded");
        Ok(config)
    }
}

fn validate_url(key: &'static str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { key, source })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::InvalidScheme { key }),
    }
}
