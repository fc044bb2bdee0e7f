//! Core of tablekit: key generation and the typed DAO protocol for
//! single-table key-value stores.
//!
//! Everything in this crate is backend-agnostic. Store clients live behind the
//! [`StoreClient`] trait; concrete backends are provided by the `tablekit` crate.

pub mod attributes;
pub mod dao;
pub mod entity;
pub mod error;
pub mod keygen;
pub mod query;
pub mod schema;
pub mod store;
pub mod update;

pub use attributes::AttributeMapping;
pub use dao::Dao;
pub use entity::Entity;
pub use error::{DaoError, KeygenError, StoreError};
pub use keygen::{generate, FieldToken, GeneratedKey, KeyRule, KeygenRules, KEY_SEPARATOR};
pub use query::{KeyCondition, KeyExpression, SortCondition, SortOp};
pub use schema::{KeySchema, TableSpec};
pub use store::{StoreClient, UpdateAck, WriteCondition};
pub use update::{RenderedUpdate, UpdateExpression};
