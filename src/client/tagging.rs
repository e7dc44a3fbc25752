//! Request tagging: session qualifier, identity and cache-defeating headers.
//!
//! Every request to the API passes through here before it is sent. The
//! session is passed in explicitly so that a scoped fetch is tagged with the
//! session its cache key was derived from, never a value re-read later.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use url::Url;

use crate::models::{Identity, SessionId};
use crate::session::link::{has_query_param, set_query_param};

/// Header carrying the active session id.
pub const SESSION_HEADER: &str = "x-session-id";
/// Query parameter carrying the active session id.
pub const SESSION_QUERY_PARAM: &str = "session_id";
/// Header identifying the logged-in user.
pub const USER_HEADER: &str = "x-user-email";

/// Append the session query parameter unless the URL already has one.
pub fn tag_url(url: Url, session: Option<SessionId>) -> Url {
    match session {
        Some(id) if !has_query_param(&url, SESSION_QUERY_PARAM) => {
            set_query_param(&url, SESSION_QUERY_PARAM, Some(&id.to_string()))
        }
        _ => url,
    }
}

/// Headers attached to every outgoing request.
pub fn tag_headers(session: Option<SessionId>, identity: &Identity) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));

    if let Some(id) = session {
        if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
            headers.insert(HeaderName::from_static(SESSION_HEADER), value);
        }
    }

    if let Some(email) = identity.header_email() {
        match HeaderValue::from_str(email) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(USER_HEADER), value);
            }
            Err(_) => tracing::warn!("Stored email is not a valid header value; sending without it"),
        }
    }

    headers
}
