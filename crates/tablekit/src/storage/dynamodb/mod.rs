//! DynamoDB storage backend.
//!
//! Provides a DynamoDB-based [`tablekit_core::StoreClient`] using
//! `aws-sdk-dynamodb`.

mod client;
mod conversions;
mod error;
mod store;

pub use client::create_client;
pub use conversions::{from_item, to_item};
pub use store::DynamoDbStore;
