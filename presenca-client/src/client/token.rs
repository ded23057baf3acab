//! Session token and its on-disk store
//!
//! The bearer token returned by login is the only state this client keeps
//! between runs. It lives in `<root_folder>/session.token`, written atomically
//! with owner-only permissions.

use presenca_common::config::write_private_file;
use presenca_common::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the stored token under the root folder
pub const TOKEN_FILE_NAME: &str = "session.token";

/// Opaque bearer credential
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string; blank input yields `None`
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// File-backed token store
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store under `root_folder`
    pub fn new(root_folder: &Path) -> Self {
        Self {
            path: root_folder.join(TOKEN_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token, if any
    pub fn load(&self) -> Result<Option<SessionToken>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored session token");
            return Ok(None);
        }

        #[cfg(unix)]
        {
            if presenca_common::config::check_permissions_loose(&self.path)? {
                warn!(
                    path = %self.path.display(),
                    "Session token file is readable by other users"
                );
            }
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(SessionToken::new(content))
    }

    pub fn save(&self, token: &SessionToken) -> Result<()> {
        write_private_file(&self.path, token.as_str().as_bytes())?;
        info!(path = %self.path.display(), "Session token stored");
        Ok(())
    }

    /// Remove the stored token. Returns false if there was none.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Session token removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
