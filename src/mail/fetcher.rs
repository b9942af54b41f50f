use crate::config::DEFAULT_MAX_RESULTS;
use crate::domain::email::{Document, MessageDetail, MessageMetadata, MessageRef};
use crate::error::{FetchError, Result};
use crate::mail::decoders::find_plain_text;
use crate::mail::store::MessageStore;

/// What to fetch and how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Store search query; `None` matches everything.
    pub query: Option<String>,
    /// Desired number of messages. The last page may push the result past it.
    pub max_results: usize,
    /// Page size override; defaults to `max_results`.
    pub results_per_page: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            query: None,
            max_results: DEFAULT_MAX_RESULTS,
            results_per_page: None,
        }
    }
}

impl FetchOptions {
    pub fn page_size(&self) -> usize {
        self.results_per_page.unwrap_or(self.max_results)
    }
}

pub struct MessageFetcher<S> {
    store: S,
}

impl<S: MessageStore> MessageFetcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// List, fetch and convert matching messages, in listing order.
    ///
    /// All-or-nothing: any failed detail fetch discards what was already fetched.
    pub fn fetch(&self, opts: &FetchOptions) -> Result<Vec<Document>> {
        let refs = self.collect_refs(opts)?;

        let mut documents = Vec::with_capacity(refs.len());
        for r in &refs {
            let raw = self
                .store
                .get_message(&r.id)
                .map_err(|source| FetchError::MessageData {
                    id: r.id.clone(),
                    source,
                })?;
            documents.push(to_document(&MessageDetail::from(raw)));
        }

        log::info!("fetched {} messages", documents.len());
        Ok(documents)
    }

    /// Follow continuation tokens until `max_results` references are held.
    pub fn collect_refs(&self, opts: &FetchOptions) -> Result<Vec<MessageRef>> {
        let page_size = opts.page_size();
        if opts.max_results == 0 || page_size == 0 {
            return Err(FetchError::InvalidLimit);
        }
        let query = opts.query.as_deref();

        let first = self
            .store
            .list_messages(query, None, page_size)
            .map_err(FetchError::listing)?;
        let mut refs = first.messages.unwrap_or_default();
        let mut next = first.next_page_token;

        if refs.len() >= opts.max_results {
            return Ok(refs);
        }

        let mut page = 1;
        while let Some(token) = next.take() {
            page += 1;
            let list = self
                .store
                .list_messages(query, Some(&token), page_size)
                .map_err(FetchError::listing)?;

            match list.messages {
                Some(messages) => refs.extend(messages),
                None => log::warn!("page {page} had a continuation token but no messages"),
            }
            next = list.next_page_token;

            if refs.len() >= opts.max_results {
                break;
            }
        }

        Ok(refs)
    }
}

fn to_document(detail: &MessageDetail) -> Document {
    let text = detail
        .payload
        .as_ref()
        .map(find_plain_text)
        .unwrap_or_default();
    Document::new(text, MessageMetadata::from_detail(detail))
}
