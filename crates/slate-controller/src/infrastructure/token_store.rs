//! `TokenStore` backends.
//!
//! - [`MemoryTokenStore`] keeps the token for the lifetime of the process.
//! - [`FileTokenStore`] persists the token in a small TOML file next to the
//!   controller config:
//!
//! ```toml
//! session_token = "3f9c..."
//! ```
//!
//! A missing file means "no session".  A store writes a temporary file in
//! the same directory and renames it over the old one, so readers see
//! either the previous token or the new one, never a torn file.  The file
//! is created owner-only (0600) on Unix.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::application::auth_session::{TokenStore, TokenStoreError};

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Process-lifetime token storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, TokenStoreError> {
        self.token
            .lock()
            .map_err(|_| TokenStoreError::Corrupt("token lock poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.slot()?.clone())
    }

    fn store(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn erase(&self) -> Result<(), TokenStoreError> {
        *self.slot()? = None;
        Ok(())
    }
}

// ── File-backed ───────────────────────────────────────────────────────────────

/// On-disk shape of the token file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

/// Token storage in a TOML file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let file: TokenFile = toml::from_str(&content)
                    .map_err(|e| TokenStoreError::Corrupt(e.to_string()))?;
                Ok(file.session_token.filter(|t| !t.is_empty()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TokenStoreError::Io(e)),
        }
    }

    fn store(&self, token: &str) -> Result<(), TokenStoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let content = toml::to_string(&TokenFile {
            session_token: Some(token.to_string()),
        })
        .map_err(|e| TokenStoreError::Corrupt(e.to_string()))?;

        // tempfile creates the file with mode 0600 on Unix.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| TokenStoreError::Io(e.error))?;
        Ok(())
    }

    fn erase(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::Io(e)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
