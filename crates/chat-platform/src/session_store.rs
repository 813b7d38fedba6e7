//! Persisted sign-in state, restored on the next launch.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::debug;

use crate::{PlatformError, UserRecord};

/// Storage for the signed-in user.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<UserRecord>, PlatformError>;
    fn save(&self, user: &UserRecord) -> Result<(), PlatformError>;
    fn clear(&self) -> Result<(), PlatformError>;
}

/// Keeps the encoded record in memory. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<UserRecord>, PlatformError> {
        let slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        slot.as_deref()
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|err| PlatformError::Serialization(err.to_string()))
            })
            .transpose()
    }

    fn save(&self, user: &UserRecord) -> Result<(), PlatformError> {
        let encoded = serde_json::to_string(user)
            .map_err(|err| PlatformError::Serialization(err.to_string()))?;
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(encoded);
        Ok(())
    }

    fn clear(&self) -> Result<(), PlatformError> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}

/// JSON file on disk, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = self
            .path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("session.json");
        let now_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        parent.join(format!(".{file_name}.{now_nanos}.tmp"))
    }

    fn storage_error(&self, action: &str, err: io::Error) -> PlatformError {
        PlatformError::Storage(format!("failed {action} {}: {err}", self.path.display()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<UserRecord>, PlatformError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.storage_error("reading session", err)),
        };

        let user = serde_json::from_str::<UserRecord>(&raw).map_err(|err| {
            PlatformError::Serialization(format!(
                "failed parsing session {}: {err}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), user_id = user.id, "restored session");
        Ok(Some(user))
    }

    fn save(&self, user: &UserRecord) -> Result<(), PlatformError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| self.storage_error("creating session directory for", err))?;
        }

        let encoded = serde_json::to_vec(user)
            .map_err(|err| PlatformError::Serialization(err.to_string()))?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, encoded)
            .map_err(|err| self.storage_error("writing temp session for", err))?;

        if fs::rename(&temp_path, &self.path).is_err() {
            // Windows refuses to rename over an existing file.
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    let _ = fs::remove_file(&temp_path);
                    return Err(self.storage_error("replacing session", err));
                }
            }
            fs::rename(&temp_path, &self.path).map_err(|err| {
                let _ = fs::remove_file(&temp_path);
                self.storage_error("writing session", err)
            })?;
        }

        debug!(path = %self.path.display(), user_id = user.id, "saved session");
        Ok(())
    }

    fn clear(&self) -> Result<(), PlatformError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.storage_error("deleting session", err)),
        }
    }
}
