//! Signed-in session persisted between runs.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Access token and user kept on disk after sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token for collection calls.
    pub access_token: String,
    /// Refresh token, when the backend issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Signed-in user.
    pub user: User,
    /// When the session was established.
    pub signed_in_at: DateTime<Utc>,
}

impl StoredSession {
    /// Load a session from `path`, returning `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session {}", path.display()))?;
        let session = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse session {}", path.display()))?;
        Ok(Some(session))
    }

    /// Persist the session, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create session directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize session")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write session {}", path.display()))
    }

    /// Remove a persisted session. Missing files are ignored.
    pub fn clear(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove session {}", path.display()))?;
        }
        Ok(())
    }
}
