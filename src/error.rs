//! Error types for the message store and the fetcher.

use thiserror::Error;

/// Failures talking to the message store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The credential provider could not produce a bearer token.
    #[error("could not obtain credentials: {0:#}")]
    Credentials(anyhow::Error),

    /// HTTP 401/403.
    #[error("unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the failure comes from missing or rejected credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Credentials(_) | Self::Unauthorized { .. })
    }
}

/// Failures of a whole fetch. Nothing is returned when any of these occur.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("max_results and results_per_page must be positive")]
    InvalidLimit,

    #[error("authorization failed: {0}")]
    Authorization(StoreError),

    #[error("listing messages failed: {0}")]
    Listing(StoreError),

    #[error("can't get message data for {id}: {source}")]
    MessageData { id: String, source: StoreError },
}

impl FetchError {
    /// Classify a list-call failure.
    pub fn listing(err: StoreError) -> Self {
        if err.is_auth() {
            Self::Authorization(err)
        } else {
            Self::Listing(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
