use anyhow::{Result, anyhow};

use crate::auth::CredentialProvider;
use crate::config::{Config, DEFAULT_MAX_RESULTS};
use crate::domain::email::Document;
use crate::mail::fetcher::{FetchOptions, MessageFetcher};
use crate::mail::gmail_client::{GMAIL_API_BASE, GmailClient};
use crate::mail::store::MessageStore;

/// Reads messages from one Gmail account as [`Document`]s.
///
/// ```ignore
/// let mut reader = GmailReader::new(FetchOptions {
///     query: Some("from:me after:2023-01-01".into()),
///     ..Default::default()
/// });
/// let docs = reader.load_data(token_manager)?;
/// ```
pub struct GmailReader {
    pub options: FetchOptions,
    pub api_base: String,
    pub user_id: String,
    store: Option<Box<dyn MessageStore>>,
}

impl GmailReader {
    pub fn new(options: FetchOptions) -> Self {
        Self {
            options,
            api_base: GMAIL_API_BASE.to_string(),
            user_id: "me".to_string(),
            store: None,
        }
    }

    /// Use an already built store instead of the Gmail API client.
    pub fn with_store(options: FetchOptions, store: impl MessageStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
            ..Self::new(options)
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let mut reader = Self::new(FetchOptions {
            query: cfg.query.clone(),
            max_results: cfg.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            results_per_page: cfg.results_per_page,
        });
        if let Some(base) = &cfg.api_base {
            reader.api_base = base.clone();
        }
        if let Some(user) = &cfg.user_id {
            reader.user_id = user.clone();
        }
        reader
    }

    /// Authorize (possibly interactively), then fetch.
    pub fn load_data<C: CredentialProvider + 'static>(
        &mut self,
        credentials: C,
    ) -> Result<Vec<Document>> {
        if self.store.is_none() {
            // surface consent/refresh problems before the first API call
            credentials.access_token()?;
            let client = GmailClient::with_base(credentials, self.api_base.clone())
                .user_id(self.user_id.clone());
            self.store = Some(Box::new(client));
        }
        self.search_messages()
    }

    pub fn search_messages(&self) -> Result<Vec<Document>> {
        let store = self
            .store
            .as_deref()
            .ok_or_else(|| anyhow!("no message store configured; call load_data first"))?;
        Ok(MessageFetcher::new(store).fetch(&self.options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::email::{MessageList, MessageRef, RawMessage};
    use crate::error::StoreError;

    struct OneMessage;

    impl MessageStore for OneMessage {
        fn list_messages(
            &self,
            _query: Option<&str>,
            _page_token: Option<&str>,
            _max_results: usize,
        ) -> std::result::Result<MessageList, StoreError> {
            Ok(MessageList {
                messages: Some(vec![MessageRef {
                    id: "m1".into(),
                    thread_id: "t1".into(),
                }]),
                ..Default::default()
            })
        }

        fn get_message(&self, id: &str) -> std::result::Result<RawMessage, StoreError> {
            Ok(RawMessage {
                id: id.to_string(),
                thread_id: "t1".into(),
                ..Default::default()
            })
        }
    }

    #[test]
    fn search_without_store_fails() {
        let reader = GmailReader::new(FetchOptions::default());
        assert!(reader.search_messages().is_err());
    }

    #[test]
    fn injected_store_is_used() {
        let reader = GmailReader::with_store(FetchOptions::default(), OneMessage);
        let docs = reader.search_messages().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "");
        assert_eq!(docs[0].metadata.thread_id, "t1");
    }

    #[test]
    fn options_come_from_config() {
        let cfg = Config {
            client_id: "c".into(),
            client_secrets_file: None,
            user_email: None,
            redirect_uri: None,
            token_file: None,
            api_base: Some("http://localhost:9999".into()),
            user_id: None,
            query: Some("label:inbox".into()),
            max_results: None,
            results_per_page: Some(4),
        };
        let reader = GmailReader::from_config(&cfg);
        assert_eq!(reader.options.query.as_deref(), Some("label:inbox"));
        assert_eq!(reader.options.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(reader.options.page_size(), 4);
        assert_eq!(reader.api_base, "http://localhost:9999");
        assert_eq!(reader.user_id, "me");
    }
}
