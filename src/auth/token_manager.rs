use anyhow::{Result, anyhow};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::oauth::{self, OAuthClientConfig, Tokens};
use crate::auth::tokens_file::TokenCache;
use crate::auth::{CredentialProvider, GMAIL_READONLY_SCOPE, token_store};
use crate::config::{Config, resolve_token_path};

/// Used when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3500;

/// Cached token, then refresh token, then interactive consent.
#[derive(Clone)]
pub struct TokenManager {
    pub client: OAuthClientConfig,
    pub redirect_uri: String,
    pub user_email: String,
    pub cache: TokenCache,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let user_email = cfg
            .user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))?;

        let client = match &cfg.client_secrets_file {
            Some(path) => OAuthClientConfig::from_client_secrets_file(path)?,
            None => {
                let client_secret = token_store::load_client_secret(&cfg.client_id)?
                    .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());
                OAuthClientConfig::google(cfg.client_id.clone(), client_secret)
            }
        };

        Ok(Self {
            client,
            redirect_uri: cfg.redirect_uri(),
            user_email,
            cache: TokenCache::new(resolve_token_path(cfg)?),
        })
    }

    /// Runs the browser consent flow regardless of what is cached.
    pub fn login(&self) -> Result<String> {
        let t = oauth::perform_pkce_flow(&self.client, &self.redirect_uri, GMAIL_READONLY_SCOPE)?;
        self.persist(&t, now_epoch()?)?;
        Ok(t.access_token)
    }

    fn persist(&self, t: &Tokens, now: i64) -> Result<()> {
        let exp = t
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + DEFAULT_LIFETIME_SECS);
        self.cache.save(Some(&t.access_token), Some(exp))?;

        if let Some(rt) = &t.refresh_token {
            if let Err(e) = token_store::save_refresh_token(&self.user_email, rt) {
                log::warn!("couldn't save refresh token to keyring: {e}");
            } else {
                log::info!("saved refresh token into keyring for {}", self.user_email);
            }
        }
        Ok(())
    }
}

impl CredentialProvider for TokenManager {
    fn access_token(&self) -> Result<String> {
        let now = now_epoch()?;

        // 1) cached & not expired
        if let Some(tf) = self.cache.load()?
            && let Some(at) = tf.valid_access_token(now)
        {
            log::debug!("using cached access token");
            return Ok(at.to_string());
        }

        // 2) refresh if possible
        if let Some(rt) = token_store::load_refresh_token(&self.user_email)? {
            log::info!("access token missing or expired; refreshing");
            match oauth::refresh_access_token(&self.client, &rt) {
                Ok(t) => {
                    self.persist(&t, now)?;
                    return Ok(t.access_token);
                }
                Err(e) => log::warn!("refresh failed: {e}, falling back to interactive auth"),
            }
        }

        // 3) otherwise PKCE
        log::info!("no usable tokens; running interactive auth flow");
        self.login()
    }
}

fn now_epoch() -> Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(cache: TokenCache) -> TokenManager {
        TokenManager {
            client: OAuthClientConfig::google("client", None),
            redirect_uri: "http://127.0.0.1:8080/callback".into(),
            user_email: "me@example.com".into(),
            cache,
        }
    }

    #[test]
    fn unexpired_cached_token_is_returned_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("tokens.json"));
        let far_future = now_epoch().unwrap() + 3600;
        cache.save(Some("cached-token"), Some(far_future)).unwrap();

        let tm = manager(cache);
        assert_eq!(tm.access_token().unwrap(), "cached-token");
    }

    #[test]
    fn persist_writes_expiry_from_expires_in() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("tokens.json"));
        let tm = manager(cache.clone());

        let t = Tokens {
            access_token: "fresh".into(),
            refresh_token: None,
            expires_in: Some(60),
        };
        tm.persist(&t, 1_000).unwrap();

        let tf = cache.load().unwrap().unwrap();
        assert_eq!(tf.access_token.as_deref(), Some("fresh"));
        assert_eq!(tf.expires_at_epoch, Some(1_060));
    }

    #[test]
    fn persist_defaults_lifetime_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("tokens.json"));
        let tm = manager(cache.clone());

        let t = Tokens {
            access_token: "fresh".into(),
            refresh_token: None,
            expires_in: None,
        };
        tm.persist(&t, 1_000).unwrap();
        assert_eq!(
            cache.load().unwrap().unwrap().expires_at_epoch,
            Some(1_000 + DEFAULT_LIFETIME_SECS)
        );
    }
}
