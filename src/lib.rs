//! Fetch Gmail messages through the REST API and turn them into plain-text
//! documents with sender, recipient, subject, date and thread metadata.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod mail;
pub mod reader;

pub use domain::email::{Document, MessageMetadata};
pub use error::{FetchError, StoreError};
pub use mail::fetcher::{FetchOptions, MessageFetcher};
pub use reader::GmailReader;
