//! Query-string helpers for dashboard links and API URLs.

use url::Url;

use crate::models::SessionId;

/// Query parameter carrying the session in shareable dashboard links.
pub const LINK_PARAM: &str = "session";

/// First value of a query parameter, if present.
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn has_query_param(url: &Url, key: &str) -> bool {
    url.query_pairs().any(|(k, _)| k == key)
}

/// Replace (or remove, for `None`) every occurrence of `key`, keeping the
/// other parameters in their original order.
pub fn set_query_param(url: &Url, key: &str, value: Option<&str>) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut out = url.clone();
    out.set_query(None);
    if kept.is_empty() && value.is_none() {
        return out;
    }
    {
        let mut pairs = out.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        if let Some(v) = value {
            pairs.append_pair(key, v);
        }
    }
    out
}

/// How the link value compared to the link parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValue {
    Absent,
    Valid(SessionId),
    /// Present but zero, negative, or non-numeric.
    Invalid(String),
}

/// Read the session parameter of a dashboard link.
pub fn read_link_session(url: &Url) -> LinkValue {
    match query_param(url, LINK_PARAM) {
        None => LinkValue::Absent,
        Some(raw) => match SessionId::parse(&raw) {
            Some(id) => LinkValue::Valid(id),
            None => LinkValue::Invalid(raw),
        },
    }
}

/// Write the session parameter of a dashboard link.
pub fn write_link_session(url: &Url, session: Option<SessionId>) -> Url {
    let value = session.map(|id| id.to_string());
    set_query_param(url, LINK_PARAM, value.as_deref())
}
