use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

/// Session id carried in the `session_id` cookie, if any.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn session_cookie(session_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(SET_COOKIE, value);
    }
    headers
}

/// Existing session id, or a new one plus the header that sets it.
pub fn ensure_session(headers: &HeaderMap) -> (String, HeaderMap) {
    match session_id(headers) {
        Some(id) => (id, HeaderMap::new()),
        None => {
            let id = new_session_id();
            let set_cookie = session_cookie(&id);
            (id, set_cookie)
        }
    }
}
