//! Session Store
//!
//! Holds the bearer token used by the REST client and the channel authorizer.
//! A store is either session-only (memory) or persistent (a JSON file under the
//! user's data directory). Clones share the same state, so clearing the token
//! after a 401 is seen everywhere at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::messaging::UserId;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    #[serde(default)]
    user_id: Option<UserId>,
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user_id: Option<UserId>,
    path: Option<PathBuf>,
}

/// Shared bearer-token storage
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store backed by `path`, loading any session already saved there.
    ///
    /// A corrupt file is discarded with a warning rather than failing startup.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut state = SessionState {
            path: Some(path.clone()),
            ..Default::default()
        };
        match load(&path) {
            Ok(Some(saved)) => {
                state.token = Some(saved.token);
                state.user_id = saved.user_id;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("[SESSION] Ignoring unreadable session: {}", e),
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// `<data dir>/souq/session.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("souq").join("session.json"))
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state.read().user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().token.is_some()
    }

    /// Store a new credential, writing it through to disk for persistent stores
    pub fn set(&self, token: impl Into<String>, user_id: Option<UserId>) -> Result<(), SessionError> {
        let mut state = self.state.write();
        state.token = Some(token.into());
        state.user_id = user_id;
        if let (Some(path), Some(token)) = (state.path.as_ref(), state.token.as_ref()) {
            save(
                path,
                &PersistedSession {
                    token: token.clone(),
                    user_id,
                },
            )?;
        }
        Ok(())
    }

    /// Forget the credential (logout or rejected token)
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.token = None;
        state.user_id = None;
        if let Some(path) = state.path.as_ref() {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("[SESSION] Failed to remove {}: {}", path.display(), e);
                }
            }
        }
        tracing::info!("[SESSION] Credentials cleared");
    }
}

fn load(path: &Path) -> Result<Option<PersistedSession>, SessionError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SessionError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn save(path: &Path, session: &PersistedSession) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let text = serde_json::to_string(session)?;
    std::fs::write(path, text).map_err(io_err)
}
