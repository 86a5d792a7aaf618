//! The authenticated session: who is logged in and with which access token
//!
//! A [`SessionStore`] is created once at startup, hydrated from the persisted
//! file and then shared (`Arc`) with the HTTP layer and every component that
//! needs the auth predicates. Writes replace the whole session at once.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::SessionStoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

/// On-disk shape; exactly the two persisted fields and nothing derived
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAuth {
    user: Option<User>,
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Holder of at most one session
#[derive(Debug)]
pub struct SessionStore {
    current: watch::Sender<Option<Session>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        let (current, _) = watch::channel(None);
        Self { current, path: None }
    }

    /// Load the persisted session from `path`; a missing or unreadable file means no session
    pub fn hydrate(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match read_persisted(&path) {
            Ok(Some(session)) => {
                info!("Restored session for {}", session.user.username);
                Some(session)
            }
            Ok(None) => {
                debug!("No persisted session at {}", path.display());
                None
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        };

        let (current, _) = watch::channel(session);
        Self { current, path: Some(path) }
    }

    /// Replace the session with a new user and token
    pub fn set_auth(&self, user: User, access_token: String) {
        debug!("Storing session for {}", user.username);
        self.current.send_replace(Some(Session { user, access_token }));
        self.persist_logged();
    }

    /// Drop the session
    pub fn clear_auth(&self) {
        if self.current.send_replace(None).is_some() {
            info!("Session cleared");
        }
        self.persist_logged();
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.access_token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.current.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|s| !s.access_token.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.current.borrow().as_ref().is_some_and(|s| s.user.is_admin())
    }

    /// Watch session changes (login, refresh, logout)
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }

    /// Write the current session to disk, or nothing for an in-memory store
    pub fn persist(&self) -> Result<(), SessionStoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let persisted = match self.current.borrow().as_ref() {
            Some(session) => PersistedAuth {
                user: Some(session.user.clone()),
                access_token: Some(session.access_token.clone()),
            },
            None => PersistedAuth::default(),
        };

        write_persisted(path, &persisted)
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

fn read_persisted(path: &Path) -> Result<Option<Session>, SessionStoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SessionStoreError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let persisted: PersistedAuth =
        serde_json::from_str(&raw).map_err(|source| SessionStoreError::Json {
            path: path.display().to_string(),
            source,
        })?;

    Ok(match (persisted.user, persisted.access_token) {
        (Some(user), Some(access_token)) => Some(Session { user, access_token }),
        _ => None,
    })
}

fn write_persisted(path: &Path, persisted: &PersistedAuth) -> Result<(), SessionStoreError> {
    let io_err = |source| SessionStoreError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_vec(persisted).map_err(|source| SessionStoreError::Json {
        path: path.display().to_string(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
