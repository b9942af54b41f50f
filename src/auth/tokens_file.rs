use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Non-secret token metadata kept on disk between runs.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The cached access token, if it is still valid at `now`.
    pub fn valid_access_token(&self, now: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at_epoch) {
            (Some(at), Some(exp)) if now < exp => Some(at),
            _ => None,
        }
    }
}

/// Token cache at a caller-chosen path.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save access_token (non-secret) and expiry epoch
    pub fn save(&self, access_token: Option<&str>, expires_at_epoch: Option<i64>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tf = TokensFile {
            access_token: access_token.map(|s| s.to_string()),
            expires_at_epoch,
        };
        let s = serde_json::to_string_pretty(&tf)?;
        fs::write(&self.path, s)
            .with_context(|| format!("writing token cache {}", self.path.display()))?;
        Ok(())
    }

    /// Load tokens file if present
    pub fn load(&self) -> Result<Option<TokensFile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&self.path)?;
        let tf: TokensFile = serde_json::from_str(&s)
            .with_context(|| format!("parsing token cache {}", self.path.display()))?;
        Ok(Some(tf))
    }
}
