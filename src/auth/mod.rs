pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

use anyhow::Result;

/// Read-only Gmail access; nothing else is requested.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Source of a currently valid bearer token.
pub trait CredentialProvider {
    /// Returns a valid access token, refreshing or re-acquiring it if needed.
    fn access_token(&self) -> Result<String>;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for &P {
    fn access_token(&self) -> Result<String> {
        (**self).access_token()
    }
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Box<P> {
    fn access_token(&self) -> Result<String> {
        (**self).access_token()
    }
}

/// A fixed token, e.g. one handed over on the command line.
#[derive(Clone)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
