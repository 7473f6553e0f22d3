//! Authentication session.
//!
//! The logged-in account and its bearer token, passed explicitly to every
//! component that needs it. Lifecycle:
//!
//! - [`AuthSession::restore`] on startup loads whatever the [`TokenStore`]
//!   persisted
//! - [`AuthSession::establish`] after a successful login persists and
//!   activates a new token
//! - [`AuthSession::invalidate`] on logout or on any `401` clears both the
//!   in-memory and the persisted state
//!
//! Clones share state, so invalidation by the API client is observed by every
//! holder.

use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use carebridge_proto::api::User;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;

use crate::error::ClientError;

/// Persisted credentials of a logged-in account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    /// Bearer token.
    pub access_token: String,
    /// Account the token belongs to.
    pub user: User,
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Persistence for [`AuthState`].
pub trait TokenStore: Send + Sync {
    /// Load persisted state. `None` if nothing was saved.
    fn load(&self) -> Result<Option<AuthState>, ClientError>;

    /// Persist state, replacing any previous value.
    fn save(&self, state: &AuthState) -> Result<(), ClientError>;

    /// Remove persisted state. Succeeds if nothing was saved.
    fn clear(&self) -> Result<(), ClientError>;
}

/// Volatile store; state is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: std::sync::Mutex<Option<AuthState>>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<AuthState>>, ClientError> {
        self.state.lock().map_err(|_| ClientError::Store("memory store poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AuthState>, ClientError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, state: &AuthState) -> Result<(), ClientError> {
        *self.lock()? = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store backed by the file at `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AuthState>, ClientError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Store(format!("read {}: {e}", self.path.display()))),
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // A corrupt file is treated as logged out rather than fatal.
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable token file");
                Ok(None)
            },
        }
    }

    /// Written to a temporary file in the same directory, then renamed over
    /// the old one. The temporary file is created owner-only (`0600` on
    /// unix), so the token is never readable by other users, and a crash
    /// mid-write leaves the previous file intact.
    fn save(&self, state: &AuthState) -> Result<(), ClientError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ClientError::Store(format!("create {}: {e}", parent.display())))?;
                parent
            },
            None => Path::new("."),
        };

        let bytes = serde_json::to_vec(state).map_err(|e| ClientError::Store(e.to_string()))?;

        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| ClientError::Store(format!("create temp in {}: {e}", dir.display())))?;
        file.write_all(&bytes)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| ClientError::Store(format!("write {}: {e}", file.path().display())))?;
        file.persist(&self.path)
            .map_err(|e| ClientError::Store(format!("write {}: {}", self.path.display(), e.error)))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Store(format!("remove {}: {e}", self.path.display()))),
        }
    }
}

/// Shared handle to the current login.
#[derive(Clone)]
pub struct AuthSession {
    state: Arc<RwLock<Option<AuthState>>>,
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession").finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Logged-out session backed by `store`.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { state: Arc::new(RwLock::new(None)), store }
    }

    /// Logged-out session with a volatile store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Load persisted state, returning the restored account if any.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        let loaded = self.store.load()?;
        let user = loaded.as_ref().map(|s| s.user.clone());
        *self.state.write().await = loaded;

        if let Some(user) = &user {
            tracing::info!(user_id = %user.id, "restored login");
        }
        Ok(user)
    }

    /// Persist and activate a new login.
    pub async fn establish(&self, state: AuthState) -> Result<(), ClientError> {
        self.store.save(&state)?;
        tracing::info!(user_id = %state.user.id, "login established");
        *self.state.write().await = Some(state);
        Ok(())
    }

    /// Drop the current login, in memory and on disk.
    ///
    /// The in-memory state is cleared even if the store fails.
    pub async fn invalidate(&self) -> Result<(), ClientError> {
        let was_logged_in = self.state.write().await.take().is_some();
        if was_logged_in {
            tracing::info!("login cleared");
        }
        self.store.clear()
    }

    /// Bearer token for requests. `None` when logged out.
    pub async fn bearer(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.access_token.clone())
    }

    /// Logged-in account. `None` when logged out.
    pub async fn user(&self) -> Option<User> {
        self.state.read().await.as_ref().map(|s| s.user.clone())
    }

    /// Whether an account is logged in.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use carebridge_proto::api::Role;

    use super::*;

    fn sample_state() -> AuthState {
        AuthState {
            access_token: "bearer-123".into(),
            user: User { id: "u1".into(), alias: "kim".into(), role: Role::Patient, email: None },
        }
    }

    #[tokio::test]
    async fn establish_restore_invalidate() {
        let store = Arc::new(MemoryTokenStore::new());
        let auth = AuthSession::new(store.clone());
        assert!(!auth.is_authenticated().await);

        auth.establish(sample_state()).await.unwrap();
        assert_eq!(auth.bearer().await.as_deref(), Some("bearer-123"));

        let other = AuthSession::new(store.clone());
        assert_eq!(other.restore().await.unwrap().map(|u| u.alias), Some("kim".into()));

        auth.invalidate().await.unwrap();
        assert!(!auth.is_authenticated().await);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let auth = AuthSession::in_memory();
        let clone = auth.clone();

        auth.establish(sample_state()).await.unwrap();
        assert!(clone.is_authenticated().await);

        clone.invalidate().await.unwrap();
        assert_eq!(auth.user().await, None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("auth.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_state()));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("auth.json"));
        store.save(&sample_state()).unwrap();
        store.save(&sample_state()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "token file mode {mode:o}");
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("auth.json"));
        store.save(&sample_state()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn corrupt_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, b"{truncated").unwrap();

        assert_eq!(FileTokenStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn debug_redacts_token() {
        assert!(!format!("{:?}", sample_state()).contains("bearer-123"));
    }
}
