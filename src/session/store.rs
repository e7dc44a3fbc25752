//! Persistent client-side state: the active session, UI toggles and the
//! locally stored login flags.
//!
//! The store is an explicit object handed to whatever needs it. Clones share
//! the same state, so the request-tagging layer reads the active session
//! synchronously from the same place the UI writes it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use url::Url;

use super::link::{read_link_session, write_link_session, LinkValue};
use crate::error::{ApiError, Result};
use crate::models::{Identity, SessionId};

/// Serialized form of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub active_session: Option<SessionId>,
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub identity: Identity,
}

/// What reconciling a dashboard link did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// The link carried a valid session different from the stored one; the
    /// store now follows the link.
    Adopted,
    /// The link and the store already agreed.
    InSync,
    /// The link had no session; the stored one was written into it.
    Repaired,
    /// The link carried an unusable value; it was replaced by the stored one.
    Rejected,
}

/// Result of reconciling a dashboard link with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSync {
    /// The link after reconciliation.
    pub url: Url,
    /// The session now active.
    pub session: Option<SessionId>,
    pub action: LinkAction,
}

/// Shared, persisted client state.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<StoreState>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Open the store backed by `path`, starting empty if the file does not
    /// exist. A corrupt file is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<StoreState>(&contents) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable state file {}: {}",
                        path.display(),
                        e
                    );
                    StoreState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(ApiError::Io(e)),
        };
        tracing::debug!(
            "Opened state file {} (active session: {:?})",
            path.display(),
            state.active_session
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            path: Some(path),
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::with_state(StoreState::default())
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            path: None,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the whole state.
    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }

    /// The active session, if any.
    pub fn active(&self) -> Option<SessionId> {
        self.read().active_session
    }

    /// Apply `change` to a copy of the state, persist the copy and only then
    /// make it current. On a failed write the state is left as it was.
    fn update<R>(&self, change: impl FnOnce(&mut StoreState) -> R) -> Result<R> {
        let mut state = self.write();
        let mut next = state.clone();
        let out = change(&mut next);
        self.persist(&next)?;
        *state = next;
        Ok(out)
    }

    /// Change the active session. This is the only way it changes.
    pub fn set_active(&self, session: Option<SessionId>) -> Result<()> {
        let changed = self.update(|state| {
            let changed = state.active_session != session;
            state.active_session = session;
            changed
        })?;
        if changed {
            tracing::info!("Active session set to {:?}", session);
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.set_active(None)
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.read().sidebar_collapsed
    }

    /// Flip the sidebar toggle and return the new value.
    pub fn toggle_sidebar(&self) -> Result<bool> {
        self.update(|state| {
            state.sidebar_collapsed = !state.sidebar_collapsed;
            state.sidebar_collapsed
        })
    }

    pub fn identity(&self) -> Identity {
        self.read().identity.clone()
    }

    pub fn set_identity(&self, identity: Identity) -> Result<()> {
        self.update(|state| state.identity = identity)
    }

    /// Forget the login flags. The active session is kept.
    pub fn logout(&self) -> Result<()> {
        self.set_identity(Identity::default())
    }

    /// Reconcile a dashboard link with the stored session.
    ///
    /// A valid link value wins over the stored one. A missing value is
    /// repaired by writing the stored session into the link. Zero, negative
    /// or non-numeric values are never propagated to the store.
    pub fn reconcile_link(&self, url: &Url) -> Result<LinkSync> {
        let stored = self.active();
        match read_link_session(url) {
            LinkValue::Valid(id) if Some(id) == stored => Ok(LinkSync {
                url: url.clone(),
                session: stored,
                action: LinkAction::InSync,
            }),
            LinkValue::Valid(id) => {
                self.set_active(Some(id))?;
                Ok(LinkSync {
                    url: url.clone(),
                    session: Some(id),
                    action: LinkAction::Adopted,
                })
            }
            LinkValue::Absent => Ok(LinkSync {
                url: write_link_session(url, stored),
                session: stored,
                action: if stored.is_some() {
                    LinkAction::Repaired
                } else {
                    LinkAction::InSync
                },
            }),
            LinkValue::Invalid(raw) => {
                tracing::warn!("Ignoring invalid session '{}' in link", raw);
                Ok(LinkSync {
                    url: write_link_session(url, stored),
                    session: stored,
                    action: LinkAction::Rejected,
                })
            }
        }
    }

    /// Shareable link reproducing the current view.
    pub fn link_for(&self, base: &Url) -> Url {
        write_link_session(base, self.active())
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let contents = serde_json::to_string_pretty(state)
            .map_err(|e| ApiError::State(format!("Failed to serialize state: {}", e)))?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        // Write to a sibling temp file, then rename over the target.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ApiError::Io(e.error))?;
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u64) -> SessionId {
        SessionId::new(n).unwrap()
    }

    fn link(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.active(), None);
        store.set_active(Some(sid(42))).unwrap();
        assert!(store.toggle_sidebar().unwrap());
        store
            .set_identity(Identity::user("ana@example.com", true))
            .unwrap();

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.active(), Some(sid(42)));
        assert!(reopened.sidebar_collapsed());
        assert!(reopened.identity().is_admin);
    }

    #[test]
    fn test_corrupt_state_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.snapshot(), StoreState::default());
        store.set_active(Some(sid(1))).unwrap();
        assert_eq!(SessionStore::open(&path).unwrap().active(), Some(sid(1)));
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = SessionStore::open(&path).unwrap();
        store.set_active(Some(sid(3))).unwrap();

        // Replace the state directory with a plain file so writes fail.
        fs::remove_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested"), "").unwrap();

        assert!(store.set_active(Some(sid(9))).is_err());
        assert!(store.toggle_sidebar().is_err());
        assert!(store
            .set_identity(Identity::user("ana@example.com", false))
            .is_err());

        assert_eq!(store.active(), Some(sid(3)));
        assert!(!store.sidebar_collapsed());
        assert_eq!(store.identity(), Identity::default());
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        store.set_active(Some(sid(7))).unwrap();
        assert_eq!(other.active(), Some(sid(7)));
    }

    #[test]
    fn test_isolated_instances() {
        let a = SessionStore::in_memory();
        let b = SessionStore::in_memory();
        a.set_active(Some(sid(1))).unwrap();
        assert_eq!(b.active(), None);
    }

    #[test]
    fn test_link_wins_on_mismatch() {
        let store = SessionStore::in_memory();
        store.set_active(Some(sid(3))).unwrap();

        let sync = store
            .reconcile_link(&link("https://dash.example/?session=8"))
            .unwrap();
        assert_eq!(sync.action, LinkAction::Adopted);
        assert_eq!(sync.session, Some(sid(8)));
        assert_eq!(store.active(), Some(sid(8)));
    }

    #[test]
    fn test_missing_link_value_is_repaired() {
        let store = SessionStore::in_memory();
        store.set_active(Some(sid(5))).unwrap();

        let sync = store
            .reconcile_link(&link("https://dash.example/charts?tab=products"))
            .unwrap();
        assert_eq!(sync.action, LinkAction::Repaired);
        assert_eq!(
            sync.url.as_str(),
            "https://dash.example/charts?tab=products&session=5"
        );
    }

    #[test]
    fn test_invalid_link_values_are_not_propagated() {
        for bad in ["0", "-4", "abc", "1.5"] {
            let store = SessionStore::in_memory();
            store.set_active(Some(sid(2))).unwrap();
            let sync = store
                .reconcile_link(&link(&format!("https://dash.example/?session={}", bad)))
                .unwrap();
            assert_eq!(sync.action, LinkAction::Rejected, "value {}", bad);
            assert_eq!(store.active(), Some(sid(2)));
            assert_eq!(sync.url.as_str(), "https://dash.example/?session=2");

            let empty = SessionStore::in_memory();
            let sync = empty
                .reconcile_link(&link(&format!("https://dash.example/?session={}", bad)))
                .unwrap();
            assert_eq!(sync.session, None);
            assert_eq!(empty.active(), None);
        }
    }

    #[test]
    fn test_link_for_active_session() {
        let store = SessionStore::in_memory();
        let base = link("https://dash.example/");
        assert_eq!(store.link_for(&base).as_str(), "https://dash.example/");
        store.set_active(Some(sid(11))).unwrap();
        assert_eq!(
            store.link_for(&base).as_str(),
            "https://dash.example/?session=11"
        );
    }
}
