use log::info;
use std::fs;
use std::io;
use std::path::{ Path, PathBuf };
use std::sync::Mutex;
use thiserror::Error;

use crate::models::user::UserProfile;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Session JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Holds the last known user and bearer token between runs. Owned by the app
/// and handed to screens by reference; last writer wins, no versioning.
pub trait SessionStore: Send + Sync {
    fn load_user(&self) -> Result<Option<UserProfile>, SessionError>;
    fn save_user(&self, user: &UserProfile) -> Result<(), SessionError>;
    fn clear_user(&self) -> Result<(), SessionError>;

    fn load_token(&self) -> Result<Option<String>, SessionError>;
    fn save_token(&self, token: &str) -> Result<(), SessionError>;
    fn clear_token(&self) -> Result<(), SessionError>;
}

/// File-backed store: the user document as JSON at one path, the bearer
/// token as plain text at another.
pub struct FileSessionStore {
    user_path: PathBuf,
    token_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(user_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            user_path: user_path.into(),
            token_path: token_path.into(),
        }
    }

    fn ensure_parent(path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load_user(&self) -> Result<Option<UserProfile>, SessionError> {
        if !self.user_path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.user_path)?;
        let user: UserProfile = serde_json::from_str(&raw)?;
        info!("Restored session for user {}", user.id);
        Ok(Some(user))
    }

    fn save_user(&self, user: &UserProfile) -> Result<(), SessionError> {
        Self::ensure_parent(&self.user_path)?;
        let raw = serde_json::to_string_pretty(user)?;
        fs::write(&self.user_path, raw)?;
        Ok(())
    }

    fn clear_user(&self) -> Result<(), SessionError> {
        if self.user_path.exists() {
            fs::remove_file(&self.user_path)?;
        }
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>, SessionError> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.token_path)?.trim().to_string();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token))
    }

    fn save_token(&self, token: &str) -> Result<(), SessionError> {
        Self::ensure_parent(&self.token_path)?;
        fs::write(&self.token_path, token)?;
        Ok(())
    }

    fn clear_token(&self) -> Result<(), SessionError> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)?;
        }
        Ok(())
    }
}

/// In-memory store used by tests.
#[derive(Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<UserProfile>>,
    token: Mutex<Option<String>>,
}

impl SessionStore for MemorySessionStore {
    fn load_user(&self) -> Result<Option<UserProfile>, SessionError> {
        Ok(self.user.lock().unwrap().clone())
    }

    fn save_user(&self, user: &UserProfile) -> Result<(), SessionError> {
        *self.user.lock().unwrap() = Some(user.clone());
        Ok(())
    }

    fn clear_user(&self) -> Result<(), SessionError> {
        *self.user.lock().unwrap() = None;
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn save_token(&self, token: &str) -> Result<(), SessionError> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), SessionError> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}
