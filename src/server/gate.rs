use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use super::state::SharedState;

pub const MAINTENANCE_PATH: &str = "/maintenance";

const BYPASS_PREFIXES: &[&str] = &["/api", "/admin", "/auth", "/static", "/_next"];

/// Redirect page navigations while maintenance is on, and away from the
/// maintenance page while it is off. API, admin, and asset paths pass through.
pub async fn maintenance_gate(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    match redirect_target(request.uri().path(), state.maintenance.is_enabled()) {
        Some(target) => Redirect::temporary(target).into_response(),
        None => next.run(request).await,
    }
}

fn redirect_target(path: &str, maintenance_on: bool) -> Option<&'static str> {
    if BYPASS_PREFIXES.iter().any(|p| path.starts_with(p)) || path.contains('.') {
        return None;
    }

    match (maintenance_on, path == MAINTENANCE_PATH) {
        (true, false) => Some(MAINTENANCE_PATH),
        (false, true) => Some("/"),
        _ => None,
    }
}
