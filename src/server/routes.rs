use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::{info, warn};

use super::errors::AppError;
use super::state::SharedState;
use crate::admin::{
    AdminSessions, LoginRequest, LoginResponse, MaintenanceStatus, MaintenanceUpdate,
    token_from_cookie_header,
};
use crate::feed;
use crate::translate::{TranslationRequest, TranslationResult};
use crate::weather::types::WeatherData;

/// `GET /api/manorama-news`. Always 200; failures degrade to the fallback item.
pub async fn news_handler(State(state): State<SharedState>) -> Response {
    let items = feed::news_or_fallback(&state.http, &state.feed_url).await;
    info!(items = items.len(), "news served");

    (
        [(ACCESS_CONTROL_ALLOW_ORIGIN, "*"), (CACHE_CONTROL, "no-store")],
        Json(items),
    )
        .into_response()
}

/// `GET /api/News`. Merged multi-publisher headlines; never fails.
pub async fn aggregated_news_handler(State(state): State<SharedState>) -> Response {
    let items = state.news.latest().await;
    info!(items = items.len(), "aggregated news served");

    (
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        ],
        Json(items),
    )
        .into_response()
}

/// `POST /api/translate`.
pub async fn translate_handler(State(state): State<SharedState>, body: Bytes) -> Response {
    let request: TranslationRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "unreadable translate request");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TranslationResult {
                    translated_text: String::new(),
                }),
            )
                .into_response();
        }
    };

    let (Some(text), Some(target)) = (
        request.text.filter(|t| !t.is_empty()),
        request.target_lang.filter(|t| !t.is_empty()),
    ) else {
        return AppError::MalformedInput("Missing text or target language").into_response();
    };

    let translated = state.translator.translate(&text, &target).await;
    let translated_text = if translated.is_empty() { text } else { translated };

    Json(TranslationResult { translated_text }).into_response()
}

/// `GET /api/weather`.
pub async fn weather_handler(
    State(state): State<SharedState>,
) -> Result<Json<WeatherData>, AppError> {
    let data = state
        .weather
        .current()
        .await
        .inspect_err(|e| warn!(error = %e, "weather lookup failed"))?;
    Ok(Json(data))
}

/// `POST /api/admin/login`.
pub async fn login_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "unreadable login request");
        AppError::UnreadableLogin
    })?;

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(AppError::MalformedInput("Missing username or password"));
    };

    if !state.verifier.verify(&username, &password).await {
        warn!(username = %username, "admin login rejected");
        return Err(AppError::Unauthorized);
    }

    let token = state.sessions.issue();
    info!(username = %username, "admin login succeeded");

    Ok((
        [(SET_COOKIE, AdminSessions::cookie(&token))],
        Json(LoginResponse {
            success: true,
            error: None,
        }),
    )
        .into_response())
}

/// `GET /api/maintenance`.
pub async fn maintenance_status_handler(
    State(state): State<SharedState>,
) -> Json<MaintenanceStatus> {
    Json(state.maintenance.status())
}

/// `PUT /api/admin/maintenance`. Requires a session cookie from `/api/admin/login`;
/// the body is only read once the session checks out.
pub async fn maintenance_update_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MaintenanceStatus>, AppError> {
    let authorized = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(token_from_cookie_header)
        .any(|token| state.sessions.is_valid(token));

    if !authorized {
        return Err(AppError::Unauthorized);
    }

    let update: MaintenanceUpdate = serde_json::from_slice(&body)
        .map_err(|_| AppError::MalformedInput("Body must be {\"enabled\": bool}"))?;

    state.maintenance.set(update.enabled);
    Ok(Json(state.maintenance.status()))
}

/// `GET /maintenance`.
pub async fn maintenance_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Dear Kochi</title></head>\
         <body><h1>We'll be back soon</h1>\
         <p>Dear Kochi is undergoing scheduled maintenance.</p></body></html>",
    )
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
