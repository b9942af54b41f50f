use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "gmail_reader";

fn set(key: &str, secret: &str) -> Result<()> {
    Entry::new(SERVICE, key)?
        .set_password(secret)
        .map_err(|e| anyhow!(e.to_string()))
}

fn get(key: &str) -> Result<Option<String>> {
    match Entry::new(SERVICE, key)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Save a refresh token into the OS keyring for the given username (email)
pub fn save_refresh_token(username: &str, refresh_token: &str) -> Result<()> {
    set(username, refresh_token)
}

/// Load a refresh token from the keyring for the given username (email)
pub fn load_refresh_token(username: &str) -> Result<Option<String>> {
    get(username)
}

/// Save a client secret into the keyring, keyed by client_id
pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    set(client_id, client_secret)
}

/// Load client secret from keyring by client_id
pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    get(client_id)
}
