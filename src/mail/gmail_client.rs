//! Gmail REST API (v1) as a [`MessageStore`].
//!
//! Only two endpoints are used:
//! - `users.messages.list` for paged search results
//! - `users.messages.get` with `format=full` for headers and the MIME tree

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::CredentialProvider;
use crate::domain::email::{MessageList, RawMessage};
use crate::error::StoreError;
use crate::mail::store::MessageStore;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

pub struct GmailClient<C> {
    http: Client,
    api_base: String,
    user_id: String,
    credentials: C,
}

impl<C: CredentialProvider> GmailClient<C> {
    pub fn new(credentials: C) -> Self {
        Self::with_base(credentials, GMAIL_API_BASE)
    }

    /// Point the client at another host (a proxy or a test server).
    pub fn with_base(credentials: C, api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            user_id: "me".to_string(),
            credentials,
        }
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// `.../users/{user_id}/messages[/{id}]`, each segment percent-encoded.
    fn messages_url(&self, id: Option<&str>) -> Result<Url, StoreError> {
        let invalid = || StoreError::InvalidUrl(self.api_base.clone());
        let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid())?;
            segments
                .pop_if_empty()
                .extend(["gmail", "v1", "users", self.user_id.as_str(), "messages"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T, StoreError> {
        let token = self
            .credentials
            .access_token()
            .map_err(StoreError::Credentials)?;

        let response = self.http.get(url).query(query).bearer_auth(token).send()?;
        parse_response(response)
    }
}

fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    let text = response.text()?;

    if !status.is_success() {
        return Err(match status.as_u16() {
            401 | 403 => StoreError::Unauthorized {
                status: status.as_u16(),
                body: text,
            },
            404 => StoreError::NotFound(text),
            code => StoreError::Http { status: code, body: text },
        });
    }

    Ok(serde_json::from_str(&text)?)
}

impl<C: CredentialProvider> MessageStore for GmailClient<C> {
    fn list_messages(
        &self,
        query: Option<&str>,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessageList, StoreError> {
        let mut params = vec![("maxResults", max_results.to_string())];
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        log::debug!("listing messages (page_token={page_token:?}, max_results={max_results})");
        self.get(self.messages_url(None)?, &params)
    }

    fn get_message(&self, id: &str) -> Result<RawMessage, StoreError> {
        log::debug!("fetching message {id}");
        self.get(self.messages_url(Some(id))?, &[("format", "full".to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    #[test]
    fn message_ids_are_percent_encoded_in_the_path() {
        let client = GmailClient::with_base(StaticToken("t".into()), "http://localhost:8080/");
        let url = client.messages_url(Some("a/b c")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/gmail/v1/users/me/messages/a%2Fb%20c"
        );
    }

    #[test]
    fn list_url_uses_configured_user() {
        let client = GmailClient::new(StaticToken("t".into())).user_id("someone@example.com");
        assert_eq!(
            client.messages_url(None).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/someone@example.com/messages"
        );
    }

    #[test]
    fn unparsable_base_is_rejected() {
        let client = GmailClient::with_base(StaticToken("t".into()), "not a url");
        assert!(matches!(
            client.messages_url(None),
            Err(StoreError::InvalidUrl(_))
        ));
    }
}
