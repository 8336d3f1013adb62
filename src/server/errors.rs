use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::weather::WeatherError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    MalformedInput(&'static str),

    #[error("Invalid credentials")]
    Unauthorized,

    /// Login body that could not be read as JSON.
    #[error("Server error")]
    UnreadableLogin,

    #[error("weather unavailable: {0}")]
    WeatherUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MalformedInput(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "error": self.to_string() }),
            ),
            AppError::UnreadableLogin => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": self.to_string() }),
            ),
            AppError::WeatherUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch weather data" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        AppError::WeatherUnavailable(e.to_string())
    }
}
