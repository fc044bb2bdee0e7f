//! Storage backends and configuration for `tablekit_core`.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): [`storage::InMemoryStore`], a process-local store
//!   with the same per-item conditional semantics as DynamoDB.
//! - `dynamodb`: [`storage::DynamoDbStore`] backed by `aws-sdk-dynamodb`.

pub mod config;
pub mod storage;

pub use config::StoreConfig;
