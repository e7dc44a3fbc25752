//! Session models.
//!
//! A session is a named, shareable subset of documents plus the users allowed
//! to view it. Every analytics and document view is scoped to the active one.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Identifier of a server-side session. Always a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SessionId(u64);

impl SessionId {
    /// Create a session id, rejecting zero.
    pub fn new(value: u64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse a session id from user-supplied text (a link parameter, a CLI
    /// argument). Only plain positive decimal integers are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u64>().ok().and_then(Self::new)
    }
}

impl TryFrom<u64> for SessionId {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "session id must be a positive integer".to_string())
    }
}

impl From<SessionId> for u64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{}' is not a positive integer session id", s))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A session as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_opt",
        serialize_with = "timestamp::serialize_opt"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Email (or other identifier) of the creating user.
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub document_ids: BTreeSet<i64>,
    #[serde(default)]
    pub user_emails: BTreeSet<String>,
}

impl Session {
    /// Only the creator or an administrator may delete a session.
    pub fn can_delete(&self, identity: &Identity) -> bool {
        if identity.is_admin {
            return true;
        }
        match (&self.created_by, &identity.email) {
            (Some(owner), Some(email)) => owner.eq_ignore_ascii_case(email),
            _ => false,
        }
    }

    pub fn document_count(&self) -> usize {
        self.document_ids.len()
    }
}

/// Request body for session creation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSession {
    pub name: String,
    pub document_ids: Vec<i64>,
    pub user_emails: Vec<String>,
}

impl NewSession {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_documents(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.document_ids.extend(ids);
        self
    }

    pub fn with_users(mut self, emails: impl IntoIterator<Item = String>) -> Self {
        self.user_emails.extend(emails);
        self
    }

    /// Trim the name and drop duplicate ids and emails.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err("session name must not be empty".to_string());
        }
        let mut seen = BTreeSet::new();
        self.document_ids.retain(|id| seen.insert(*id));
        let mut seen = BTreeSet::new();
        self.user_emails = self
            .user_emails
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty() && seen.insert(e.to_lowercase()))
            .collect();
        Ok(self)
    }
}

/// Locally stored login state. Authentication itself happens out of band;
/// the email travels as a user-identifying header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub logged_in: bool,
}

impl Identity {
    pub fn user(email: impl Into<String>, is_admin: bool) -> Self {
        Self {
            email: Some(email.into()),
            is_admin,
            logged_in: true,
        }
    }

    /// Email to send with requests, only while logged in.
    pub fn header_email(&self) -> Option<&str> {
        if self.logged_in {
            self.email.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_parse() {
        assert_eq!(SessionId::parse("42"), SessionId::new(42));
        assert_eq!(SessionId::parse(" 7 "), SessionId::new(7));
        assert_eq!(SessionId::parse("0"), None);
        assert_eq!(SessionId::parse("-3"), None);
        assert_eq!(SessionId::parse("+3"), None);
        assert_eq!(SessionId::parse("abc"), None);
        assert_eq!(SessionId::parse("4.5"), None);
        assert_eq!(SessionId::parse(""), None);
    }

    #[test]
    fn test_session_deserialize_minimal() {
        let session: Session = serde_json::from_str(r#"{"id": 3, "name": "Q1"}"#).unwrap();
        assert_eq!(session.id.get(), 3);
        assert!(session.document_ids.is_empty());
        assert!(session.created_at.is_none());
    }

    #[test]
    fn test_session_rejects_zero_id() {
        let result: Result<Session, _> = serde_json::from_str(r#"{"id": 0, "name": "bad"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_deserialize_full() {
        let json = r#"{
            "id": 9,
            "name": "Audit",
            "created_at": "2024-05-01T08:00:00",
            "created_by": "ana@example.com",
            "document_ids": [3, 1, 3],
            "user_emails": ["bo@example.com"]
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.document_count(), 2);
        assert!(session.created_at.is_some());
    }

    #[test]
    fn test_can_delete() {
        let session = Session {
            id: SessionId::new(1).unwrap(),
            name: "x".into(),
            created_at: None,
            created_by: Some("Ana@Example.com".into()),
            document_ids: BTreeSet::new(),
            user_emails: BTreeSet::new(),
        };
        assert!(session.can_delete(&Identity::user("ana@example.com", false)));
        assert!(!session.can_delete(&Identity::user("bo@example.com", false)));
        assert!(session.can_delete(&Identity::user("bo@example.com", true)));
        assert!(!session.can_delete(&Identity::default()));
    }

    #[test]
    fn test_new_session_normalized() {
        let new = NewSession::named("  Q2 ")
            .with_documents([5, 5, 6])
            .with_users(["a@x.io".to_string(), "A@x.io".to_string(), " ".to_string()])
            .normalized()
            .unwrap();
        assert_eq!(new.name, "Q2");
        assert_eq!(new.document_ids, vec![5, 6]);
        assert_eq!(new.user_emails, vec!["a@x.io".to_string()]);

        assert!(NewSession::named("   ").normalized().is_err());
    }
}
