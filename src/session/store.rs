//! Session cache persistence
//!
//! The cache is a single file, `{cache_dir}/session.json`, holding the
//! serialized cookie set of the last successful login.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing or clearing the session cache
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session cache {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to clear session cache {path}: {source}")]
    Clear { path: PathBuf, source: io::Error },
}

/// Result type for session cache operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Serialized authentication state (cookie-equivalent)
///
/// The content is opaque to the orchestration layer: it is produced by a
/// driver, written byte for byte and handed back to the driver, which
/// rejects it on restore if it cannot make sense of it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionArtifact {
    bytes: Vec<u8>,
}

impl SessionArtifact {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// tokens never end up in logs
impl fmt::Debug for SessionArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionArtifact({} bytes)", self.bytes.len())
    }
}

/// Persistence for the session artifact
///
/// `load` never fails: a missing, unreadable or empty cache simply means
/// there is no usable session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<SessionArtifact>;

    fn save(&self, artifact: &SessionArtifact) -> SessionResult<()>;

    fn clear(&self) -> SessionResult<()>;
}

/// File-backed session store
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store rooted at `cache_dir`; the directory is created on first save
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<SessionArtifact> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no cached session");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable session cache");
                return None;
            }
        };

        if bytes.is_empty() {
            tracing::warn!(path = %self.path.display(), "ignoring empty session cache");
            return None;
        }

        Some(SessionArtifact::from_bytes(bytes))
    }

    fn save(&self, artifact: &SessionArtifact) -> SessionResult<()> {
        let write_err = |source: io::Error| SessionError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // write the staging file completely before replacing the old cache
        let staging = self.staging_path();
        let mut file = fs::File::create(&staging).map_err(write_err)?;
        file.write_all(artifact.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&staging, &self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), bytes = artifact.len(), "session cached");
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Clear {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
