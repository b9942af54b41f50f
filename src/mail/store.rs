use crate::domain::email::{MessageList, RawMessage};
use crate::error::StoreError;

/// Remote mail store queried by search and by id.
pub trait MessageStore {
    /// One page of references matching `query`.
    fn list_messages(
        &self,
        query: Option<&str>,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessageList, StoreError>;

    /// Full message (headers + MIME tree).
    fn get_message(&self, id: &str) -> Result<RawMessage, StoreError>;
}

impl<S: MessageStore + ?Sized> MessageStore for &S {
    fn list_messages(
        &self,
        query: Option<&str>,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessageList, StoreError> {
        (**self).list_messages(query, page_token, max_results)
    }

    fn get_message(&self, id: &str) -> Result<RawMessage, StoreError> {
        (**self).get_message(id)
    }
}

impl<S: MessageStore + ?Sized> MessageStore for Box<S> {
    fn list_messages(
        &self,
        query: Option<&str>,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<MessageList, StoreError> {
        (**self).list_messages(query, page_token, max_results)
    }

    fn get_message(&self, id: &str) -> Result<RawMessage, StoreError> {
        (**self).get_message(id)
    }
}
