use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mail::decoders::header_map;

pub type MessageId = String;

/// Minimal `{id, threadId}` pair returned by a list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: MessageId,
    #[serde(default)]
    pub thread_id: String,
}

/// One page of `users.messages.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    /// Absent when the page is empty.
    pub messages: Option<Vec<MessageRef>>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u32>,
}

/// `users.messages.get` response as it comes off the wire (`format=full`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub snippet: Option<String>,
    pub internal_date: Option<String>,
    pub payload: Option<RawPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    pub mime_type: Option<String>,
    pub headers: Option<Vec<RawHeader>>,
    pub body: Option<RawBody>,
    pub parts: Option<Vec<RawPayload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBody {
    /// base64url encoded content
    pub data: Option<String>,
    pub size: Option<u64>,
    pub attachment_id: Option<String>,
}

/// A node of the MIME payload tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimePart {
    Leaf {
        mime_type: String,
        data: Option<String>,
    },
    Branch {
        mime_type: String,
        parts: Vec<MimePart>,
    },
}

impl From<RawPayload> for MimePart {
    fn from(raw: RawPayload) -> Self {
        let mime_type = raw.mime_type.unwrap_or_default();
        match raw.parts {
            // a text/plain node is read for its own body; its parts never are
            Some(parts) if mime_type != "text/plain" => MimePart::Branch {
                mime_type,
                parts: parts.into_iter().map(MimePart::from).collect(),
            },
            _ => MimePart::Leaf {
                mime_type,
                data: raw.body.and_then(|b| b.data),
            },
        }
    }
}

/// Full record for one message, headers keyed by lower-cased name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetail {
    pub id: MessageId,
    pub thread_id: String,
    pub snippet: String,
    pub internal_date: String,
    pub headers: HashMap<String, String>,
    pub payload: Option<MimePart>,
}

impl MessageDetail {
    /// Header value by case-insensitive name, empty when absent.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl From<RawMessage> for MessageDetail {
    fn from(raw: RawMessage) -> Self {
        let (headers, payload) = match raw.payload {
            Some(mut p) => {
                let headers = header_map(p.headers.take().as_deref().unwrap_or_default());
                (headers, Some(MimePart::from(p)))
            }
            None => (HashMap::new(), None),
        };

        Self {
            id: raw.id,
            thread_id: raw.thread_id,
            snippet: raw.snippet.unwrap_or_default(),
            internal_date: raw.internal_date.unwrap_or_default(),
            headers,
            payload,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub id: String,
    pub thread_id: String,
    pub snippet: String,
    pub internal_date: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
}

impl MessageMetadata {
    pub fn from_detail(detail: &MessageDetail) -> Self {
        Self {
            id: detail.id.clone(),
            thread_id: detail.thread_id.clone(),
            snippet: detail.snippet.clone(),
            internal_date: detail.internal_date.clone(),
            from: detail.header("from").to_string(),
            to: detail.header("to").to_string(),
            subject: detail.header("subject").to_string(),
            date: detail.header("date").to_string(),
        }
    }
}

/// One output record: body text plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: MessageMetadata,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}
