use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::admin::{AdminSessions, Argon2Verifier, CredentialVerifier, MaintenanceMode};
use crate::config::Config;
use crate::feed::NewsAggregator;
use crate::translate::TranslationBroker;
use crate::weather::WeatherClient;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

/// Everything a handler needs, built once by the startup routine.
pub struct AppState {
    pub http: Client,
    pub feed_url: String,
    pub news: NewsAggregator,
    pub translator: TranslationBroker,
    pub weather: WeatherClient,
    pub verifier: Box<dyn CredentialVerifier>,
    pub sessions: AdminSessions,
    pub maintenance: MaintenanceMode,
}

pub type SharedState = Arc<AppState>;

pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

impl AppState {
    pub fn from_config(config: &Config, http: Client) -> SharedState {
        let verifier = match config.admin_password_hash.as_deref() {
            Some(hash) => Argon2Verifier::new(&config.admin_username, hash)
                .inspect_err(|e| warn!("admin login disabled: {e}"))
                .unwrap_or_else(|_| Argon2Verifier::disabled(&config.admin_username)),
            None => Argon2Verifier::disabled(&config.admin_username),
        };

        Arc::new(Self {
            translator: TranslationBroker::from_endpoints(&http, &config.translation),
            weather: WeatherClient::new(
                http.clone(),
                &config.forecast_url,
                &config.air_quality_url,
            ),
            feed_url: config.feed_url.clone(),
            news: NewsAggregator::new(http.clone(), config.news_feeds.clone()),
            verifier: Box::new(verifier),
            sessions: AdminSessions::default(),
            maintenance: MaintenanceMode::new(config.maintenance_mode),
            http,
        })
    }
}
