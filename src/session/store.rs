use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Role, TokenPair, UserProfile};

/// The authenticated operator. One file, one `access_token` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Store freshly issued tokens. A missing refresh token keeps the old one.
    pub fn apply_tokens(&mut self, tokens: TokenPair) {
        if let Some(access) = tokens.access {
            self.access_token = Some(access);
        }
        if let Some(refresh) = tokens.refresh {
            self.refresh_token = Some(refresh);
        }
    }

    pub fn apply_profile(&mut self, profile: &UserProfile) {
        self.username = Some(profile.username.clone());
        self.role = Some(profile.role);
    }
}

/// A session bound to the file it is persisted in.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session. A missing file is an empty session.
    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Session::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Forced logout: drop every credential.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::info!(path = %self.path.display(), "Session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_missing_file_is_anonymous() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let session = store.load().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_save_load_and_clear() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let mut session = Session::default();
        session.apply_tokens(TokenPair {
            access: Some("access-1".to_string()),
            refresh: Some("refresh-1".to_string()),
        });
        session.apply_profile(&UserProfile {
            id: Some(4),
            username: "esi".to_string(),
            email: None,
            role: Role::Chef,
        });
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, session);
        assert!(loaded.is_authenticated());

        store.clear().unwrap();
        assert!(!store.load().unwrap().is_authenticated());
        store.clear().unwrap();
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let mut session = Session {
            access_token: Some("old".to_string()),
            refresh_token: Some("keep-me".to_string()),
            ..Session::default()
        };
        session.apply_tokens(TokenPair {
            access: Some("new".to_string()),
            refresh: None,
        });
        assert_eq!(session.access_token.as_deref(), Some("new"));
        assert_eq!(session.refresh_token.as_deref(), Some("keep-me"));
    }

    #[test]
    fn test_blank_token_is_not_authenticated() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"access_token": "  "}"#).unwrap();

        let session = SessionStore::new(file.path()).load().unwrap();
        assert!(!session.is_authenticated());
    }
}
