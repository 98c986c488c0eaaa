//! Admin session store.
//!
//! Holds the bearer token, session id, admin email, and theme preference,
//! persisted to a JSON file in the data directory under fixed key names
//! (`dpdp_token`, `dpdp_session`, `dpdp_email`, `dpdp_theme`). There is no
//! schema versioning; a missing or unreadable file simply yields an
//! unauthenticated session.
//!
//! The store is handed explicitly to the API client, poller, and views;
//! there is no ambient global. The token is static until re-login: no
//! refresh rotation, no client-side expiry enforcement.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::api::error::ApiResult;
use crate::api::ApiClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Persisted {
    #[serde(rename = "dpdp_token", default)]
    token: String,
    #[serde(rename = "dpdp_session", default)]
    session_id: String,
    #[serde(rename = "dpdp_email", default)]
    admin_email: String,
    #[serde(rename = "dpdp_theme", default = "default_theme")]
    theme: String,
}

impl Default for Persisted {
    fn default() -> Self {
        Self {
            token: String::new(),
            session_id: String::new(),
            admin_email: String::new(),
            theme: default_theme(),
        }
    }
}

fn default_theme() -> String {
    "dark".to_string()
}

pub struct SessionStore {
    path: PathBuf,
    inner: RwLock<Persisted>,
}

impl SessionStore {
    /// Load the session from `dir/session.json`. Absent or corrupt files
    /// produce a fresh unauthenticated session.
    pub fn load(dir: &Path) -> Arc<Self> {
        let path = dir.join("session.json");
        let persisted = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Arc::new(Self {
            path,
            inner: RwLock::new(persisted),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        !self.inner.read().token.is_empty()
    }

    /// Bearer token for the Authorization header; `None` when logged out.
    pub fn token(&self) -> Option<String> {
        let inner = self.inner.read();
        if inner.token.is_empty() {
            None
        } else {
            Some(inner.token.clone())
        }
    }

    pub fn session_id(&self) -> String {
        self.inner.read().session_id.clone()
    }

    pub fn admin_email(&self) -> String {
        self.inner.read().admin_email.clone()
    }

    pub fn theme(&self) -> String {
        self.inner.read().theme.clone()
    }

    pub fn set_theme(&self, theme: &str) {
        self.inner.write().theme = theme.to_string();
        self.persist();
    }

    /// Authenticate against the backend and persist the returned
    /// credentials. Server rejections propagate unchanged so the caller can
    /// show the server's own message inline.
    pub async fn login(&self, api: &ApiClient, email: &str, password: &str) -> ApiResult<()> {
        let response = api.login(email, password).await?;
        {
            let mut inner = self.inner.write();
            inner.token = response.token;
            inner.session_id = response.session_id;
            inner.admin_email = response.email;
        }
        self.persist();
        Ok(())
    }

    /// Best-effort server logout. Local credentials are cleared and the file
    /// rewritten regardless of whether the server call succeeds.
    pub async fn logout(&self, api: &ApiClient) {
        let session_id = self.session_id();
        if !session_id.is_empty() {
            if let Err(e) = api.logout(&session_id).await {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.clear_credentials();
    }

    /// Drop token/session/email but keep the theme preference.
    pub fn clear_credentials(&self) {
        {
            let mut inner = self.inner.write();
            inner.token.clear();
            inner.session_id.clear();
            inner.admin_email.clear();
        }
        self.persist();
    }

    fn persist(&self) {
        let json = match serde_json::to_string_pretty(&*self.inner.read()) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize session");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "Failed to create session directory");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!(error = %e, path = %self.path.display(), "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(dir.path());
        assert!(!store.is_authenticated());
        assert!(store.token().is_none());
        assert_eq!(store.theme(), "dark");
    }

    #[test]
    fn test_corrupt_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.json"), "{not json").unwrap();
        let store = SessionStore::load(dir.path());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_persist_round_trip_with_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SessionStore::load(dir.path());
            store.inner.write().token = "tok-123".to_string();
            store.inner.write().session_id = "sess-456".to_string();
            store.inner.write().admin_email = "admin@example.com".to_string();
            store.persist();
        }

        let raw = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
        assert!(raw.contains("dpdp_token"));
        assert!(raw.contains("dpdp_session"));
        assert!(raw.contains("dpdp_email"));
        assert!(raw.contains("dpdp_theme"));

        let store = SessionStore::load(dir.path());
        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("tok-123"));
        assert_eq!(store.session_id(), "sess-456");
        assert_eq!(store.admin_email(), "admin@example.com");
    }

    #[test]
    fn test_clear_credentials_keeps_theme() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(dir.path());
        store.inner.write().token = "tok".to_string();
        store.set_theme("light");

        store.clear_credentials();
        assert!(!store.is_authenticated());
        assert_eq!(store.theme(), "light");

        // Cleared state survives a reload.
        let reloaded = SessionStore::load(dir.path());
        assert!(!reloaded.is_authenticated());
        assert_eq!(reloaded.theme(), "light");
    }

    #[test]
    fn test_set_theme_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::load(dir.path());
        store.set_theme("light");
        let reloaded = SessionStore::load(dir.path());
        assert_eq!(reloaded.theme(), "light");
    }
}
