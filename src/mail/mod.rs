pub mod decoders;
pub mod fetcher;
pub mod gmail_client;
pub mod store;
