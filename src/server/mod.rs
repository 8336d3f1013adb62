//! HTTP surface: routing, CORS, maintenance gate, and graceful shutdown.

mod errors;
mod gate;
mod routes;
mod state;

pub use state::{AppState, SharedState, http_client};

use std::time::Duration;

use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/News", get(routes::aggregated_news_handler))
        .route("/api/manorama-news", get(routes::news_handler))
        .route("/api/translate", post(routes::translate_handler))
        .route("/api/weather", get(routes::weather_handler))
        .route("/api/maintenance", get(routes::maintenance_status_handler))
        .route("/api/admin/login", post(routes::login_handler))
        .route("/api/admin/maintenance", put(routes::maintenance_update_handler))
        .route(gate::MAINTENANCE_PATH, get(routes::maintenance_page))
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), gate::maintenance_gate))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let http = http_client()?;
    let state = AppState::from_config(&config, http);
    let app = router(state);

    let listener = TcpListener::bind(config.bind).await?;
    info!(address = %config.bind, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::admin::hash_password;

    const DOWN: &str = "http://127.0.0.1:9";

    fn app_with(pairs: &[(&str, String)]) -> Router {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let config = Config::from_lookup(|key| map.get(key).cloned()).unwrap();
        router(AppState::from_config(&config, http_client().unwrap()))
    }

    fn offline_app() -> Router {
        app_with(&[
            ("MANORAMA_FEED_URL", format!("{DOWN}/feed")),
            ("NEWS_FEEDS", format!("{DOWN}/a.rss,{DOWN}/b.rss")),
            ("LIBRETRANSLATE_URL", DOWN.into()),
            ("MYMEMORY_URL", DOWN.into()),
            ("GOOGLE_TRANSLATE_URL", DOWN.into()),
            ("OPEN_METEO_URL", DOWN.into()),
            ("OPEN_METEO_AIR_URL", DOWN.into()),
        ])
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn translate_without_target_is_400() {
        let response = offline_app()
            .oneshot(post_json("/api/translate", json!({ "text": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing text or target language");
    }

    #[tokio::test]
    async fn translate_invalid_json_is_500_with_empty_text() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/translate")
            .body(Body::from("{not json"))
            .unwrap();
        let response = offline_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({ "translatedText": "" }));
    }

    #[tokio::test]
    async fn translate_substitutes_original_when_all_providers_fail() {
        let response = offline_app()
            .oneshot(post_json(
                "/api/translate",
                json!({ "text": "Fort Kochi", "targetLang": "ml" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "translatedText": "Fort Kochi" }));
    }

    #[tokio::test]
    async fn translate_returns_provider_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "ഫോർട്ട് കൊച്ചി" })),
            )
            .mount(&server)
            .await;

        let app = app_with(&[
            ("LIBRETRANSLATE_URL", server.uri()),
            ("MYMEMORY_URL", DOWN.into()),
            ("GOOGLE_TRANSLATE_URL", DOWN.into()),
        ]);
        let response = app
            .oneshot(post_json(
                "/api/translate",
                json!({ "text": "Fort Kochi", "targetLang": "ml" }),
            ))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!({ "translatedText": "ഫോർട്ട് കൊച്ചി" })
        );
    }

    #[tokio::test]
    async fn news_falls_back_with_headers() {
        let response = offline_app().oneshot(get("/api/manorama-news")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = json_body(response).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["source"], "Fallback News");
    }

    #[tokio::test]
    async fn news_serves_parsed_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kerala.feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<rss><channel><item><title>Metro extension</title>\
                 <link>https://example.com/metro</link></item></channel></rss>",
            ))
            .mount(&server)
            .await;

        let app = app_with(&[("MANORAMA_FEED_URL", format!("{}/kerala.feed", server.uri()))]);
        let body = json_body(app.oneshot(get("/api/manorama-news")).await.unwrap()).await;
        assert_eq!(body[0]["title"], "Metro extension");
        assert_eq!(body[0]["category"], "Kochi Local");
    }

    #[tokio::test]
    async fn aggregated_news_falls_back_with_headers() {
        let response = offline_app().oneshot(get("/api/News")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["id"], "fallback-1");
        assert!(body[0]["fullContent"].is_string());
    }

    #[tokio::test]
    async fn aggregated_news_merges_feeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<rss><channel><item><title>Cochin shipyard order</title>\
                 <link>https://example.com/ship</link>\
                 <pubDate>Mon, 20 Oct 2025 06:00:00 +0000</pubDate></item></channel></rss>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.atom"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<feed><entry><title>Ernakulam market prices</title>
                   <link href="https://example.com/market"/>
                   <updated>2025-10-20T07:00:00Z</updated></entry></feed>"#,
            ))
            .mount(&server)
            .await;

        let app = app_with(&[(
            "NEWS_FEEDS",
            format!("{0}/a.rss,{0}/b.atom", server.uri()),
        )]);
        let body = json_body(app.oneshot(get("/api/News")).await.unwrap()).await;

        assert_eq!(body[0]["title"], "Ernakulam market prices");
        assert_eq!(body[0]["category"], "Kochi Local");
        assert_eq!(body[1]["title"], "Cochin shipyard order");
        assert_eq!(body[1]["url"], "https://example.com/ship");
    }

    #[tokio::test]
    async fn weather_failure_is_500() {
        let response = offline_app().oneshot(get("/api/weather")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to fetch weather data" })
        );
    }

    fn admin_app(maintenance: &str) -> Router {
        app_with(&[
            ("ADMIN_PASSWORD_HASH", hash_password("backwaters").unwrap()),
            ("MAINTENANCE_MODE", maintenance.into()),
        ])
    }

    async fn login(app: &Router, password: &str) -> axum::response::Response {
        app.clone()
            .oneshot(post_json(
                "/api/admin/login",
                json!({ "username": "admin", "password": password }),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let app = admin_app("false");
        let response = login(&app, "backwaters").await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("admin_session="));
        assert_eq!(json_body(response).await, json!({ "success": true }));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let response = login(&admin_app("false"), "p@ssw0rd@dmin").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_missing_field_is_400() {
        let response = admin_app("false")
            .oneshot(post_json("/api/admin/login", json!({ "username": "admin" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Missing username or password"
        );
    }

    #[tokio::test]
    async fn login_unreadable_body_is_500_with_login_shape() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/login")
            .body(Body::from("username=admin"))
            .unwrap();
        let response = admin_app("false").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "success": false, "error": "Server error" })
        );
    }

    #[tokio::test]
    async fn maintenance_update_checks_session_before_body() {
        let request = Request::builder()
            .method("PUT")
            .uri("/api/admin/maintenance")
            .body(Body::from("{broken"))
            .unwrap();
        let response = admin_app("false").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_disabled_without_hash() {
        let response = login(&offline_app(), "anything").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn maintenance_toggle_requires_session() {
        let app = admin_app("false");

        let anonymous = Request::builder()
            .method("PUT")
            .uri("/api/admin/maintenance")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"enabled":true}"#))
            .unwrap();
        let response = app.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookie = login(&app, "backwaters").await.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let authorized = Request::builder()
            .method("PUT")
            .uri("/api/admin/maintenance")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(r#"{"enabled":true}"#))
            .unwrap();
        let response = app.clone().oneshot(authorized).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "maintenanceMode": true }));

        let status = app.clone().oneshot(get("/api/maintenance")).await.unwrap();
        assert_eq!(json_body(status).await, json!({ "maintenanceMode": true }));

        let page = app.oneshot(get("/places")).await.unwrap();
        assert_eq!(page.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(page.headers()[header::LOCATION], "/maintenance");
    }

    #[tokio::test]
    async fn gate_leaves_api_alone_during_maintenance() {
        let app = admin_app("true");
        let response = app.clone().oneshot(get("/api/maintenance")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page = app.oneshot(get("/maintenance")).await.unwrap();
        assert_eq!(page.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn maintenance_page_redirects_home_when_off() {
        let page = offline_app().oneshot(get("/maintenance")).await.unwrap();
        assert_eq!(page.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(page.headers()[header::LOCATION], "/");
    }
}
