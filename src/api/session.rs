use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::api::AppState;
use crate::services::auth_service::SessionToken;

pub const SESSION_COOKIE: &str = "admin_session";

/// Response extension set by handlers that already wrote the session cookie.
#[derive(Debug, Clone, Copy)]
pub struct SessionChanged;

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &SessionToken, max_age_secs: i64) -> Option<HeaderValue> {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token.token, max_age_secs
    );
    HeaderValue::from_str(&cookie).ok()
}

pub fn clear_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name))
        .unwrap_or_else(|_| HeaderValue::from_static("invalid=; Max-Age=0"))
}

/// Resolves the admin session for every request and makes it available to
/// handlers as an `Extension<AdminSession>`. Authenticated sessions get a
/// fresh token on the way out so the idle timeout restarts; stale tokens
/// are cleared.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let now = Utc::now();
    let token = read_cookie(request.headers(), SESSION_COOKIE);
    let session = state.auth.authorize_at(token.as_deref(), now);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;
    if response.extensions().get::<SessionChanged>().is_some() {
        return response;
    }

    if session.is_admin() {
        match state.auth.refresh_at(&session, now) {
            Ok(Some(token)) => {
                let max_age = state.auth.session_timeout().num_seconds();
                if let Some(cookie) = session_cookie(&token, max_age) {
                    response.headers_mut().append(header::SET_COOKIE, cookie);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to refresh admin session: {}", e),
        }
    } else if token.is_some() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, clear_cookie(SESSION_COOKIE));
    }

    response
}
