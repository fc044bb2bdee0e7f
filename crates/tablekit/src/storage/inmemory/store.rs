//! In-memory store client.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use tablekit_core::{
    AttributeMapping, GeneratedKey, KeyCondition, StoreClient, StoreError, TableSpec, UpdateAck,
    UpdateExpression, WriteCondition,
};

use super::InMemoryError;

/// Items of one table keyed by (partition, sort), so iteration follows
/// partition then ascending sort key like a DynamoDB query.
#[derive(Debug, Default)]
struct Table {
    partition_key: String,
    sort_key: String,
    items: BTreeMap<(String, String), AttributeMapping>,
}

impl Table {
    fn new(spec: &TableSpec) -> Self {
        Self {
            partition_key: spec.partition_key.clone(),
            sort_key: spec.sort_key.clone(),
            items: BTreeMap::new(),
        }
    }

    /// Primary key of a full item.
    fn item_key(&self, item: &AttributeMapping) -> Result<(String, String), InMemoryError> {
        Ok((
            key_value(item.get(&self.partition_key), &self.partition_key)?,
            key_value(item.get(&self.sort_key), &self.sort_key)?,
        ))
    }

    /// Primary key of a request key.
    fn request_key(&self, key: &GeneratedKey) -> Result<(String, String), InMemoryError> {
        if key.len() != 2 {
            return Err(InMemoryError::Validation(format!(
                "expected exactly the key attributes {} and {}",
                self.partition_key, self.sort_key
            )));
        }
        let partition = key.get(&self.partition_key).map(|v| Value::String(v.to_string()));
        let sort = key.get(&self.sort_key).map(|v| Value::String(v.to_string()));
        Ok((
            key_value(partition.as_ref(), &self.partition_key)?,
            key_value(sort.as_ref(), &self.sort_key)?,
        ))
    }
}

fn key_value(value: Option<&Value>, attribute: &str) -> Result<String, InMemoryError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(InMemoryError::Validation(format!(
            "key attribute {attribute} cannot be an empty string"
        ))),
        Some(_) => Err(InMemoryError::Validation(format!(
            "key attribute {attribute} must be a string"
        ))),
        None => Err(InMemoryError::Validation(format!(
            "missing key attribute {attribute}"
        ))),
    }
}

fn rejected(err: InMemoryError) -> StoreError {
    StoreError::backend(err)
}

/// Process-local [`StoreClient`].
///
/// Tables must be registered up front with [`InMemoryStore::with_table`].
/// Every conditional write checks and mutates under one write lock, giving
/// the same single-item atomicity a DynamoDB conditional write has. Data is
/// not persisted and is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryStore {
    /// Creates a store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty table described by `spec`.
    pub fn with_table(self, spec: &TableSpec) -> Self {
        // Not yet shared, so the lock is uncontended.
        if let Ok(mut tables) = self.tables.try_write() {
            tables.insert(spec.name.clone(), Table::new(spec));
        }
        self
    }

    /// Registers an empty table on a store that may already be shared.
    pub async fn create_table(&self, spec: &TableSpec) {
        let mut tables = self.tables.write().await;
        tables
            .entry(spec.name.clone())
            .or_insert_with(|| Table::new(spec));
    }

    /// Number of items currently stored in `table`.
    pub async fn len(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map_or(0, |t| t.items.len())
    }

    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, Table>,
    name: &str,
) -> Result<&'a mut Table, StoreError> {
    tables
        .get_mut(name)
        .ok_or_else(|| rejected(InMemoryError::TableNotFound(name.to_string())))
}

fn table_ref<'a>(tables: &'a HashMap<String, Table>, name: &str) -> Result<&'a Table, StoreError> {
    tables
        .get(name)
        .ok_or_else(|| rejected(InMemoryError::TableNotFound(name.to_string())))
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn put_item(
        &self,
        table: &str,
        item: AttributeMapping,
        condition: WriteCondition,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let table_state = table_mut(&mut tables, table)?;
        let key = table_state.item_key(&item).map_err(rejected)?;

        if !condition.holds(table_state.items.get(&key)) {
            tracing::trace!(table, partition = %key.0, sort = %key.1, "put_item condition failed");
            return Err(StoreError::ConditionFailed);
        }

        tracing::trace!(table, partition = %key.0, sort = %key.1, "put_item");
        table_state.items.insert(key, item);
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: &GeneratedKey,
    ) -> Result<Option<AttributeMapping>, StoreError> {
        let tables = self.tables.read().await;
        let table_state = table_ref(&tables, table)?;
        let key = table_state.request_key(key).map_err(rejected)?;
        Ok(table_state.items.get(&key).cloned())
    }

    async fn update_item(
        &self,
        table: &str,
        key: &GeneratedKey,
        update: &UpdateExpression,
        condition: WriteCondition,
    ) -> Result<UpdateAck, StoreError> {
        let mut tables = self.tables.write().await;
        let table_state = table_mut(&mut tables, table)?;
        let item_key = table_state.request_key(key).map_err(rejected)?;

        if let Some(field) = update
            .fields()
            .keys()
            .find(|f| **f == table_state.partition_key || **f == table_state.sort_key)
        {
            return Err(rejected(InMemoryError::Validation(format!(
                "cannot update key attribute {field}"
            ))));
        }

        if !condition.holds(table_state.items.get(&item_key)) {
            tracing::trace!(table, partition = %item_key.0, sort = %item_key.1, "update_item condition failed");
            return Err(StoreError::ConditionFailed);
        }

        // A missing item is created from its key, as an upsert would.
        let item = table_state
            .items
            .entry(item_key.clone())
            .or_insert_with(|| key.to_mapping());
        update.apply(item);

        tracing::trace!(table, partition = %item_key.0, sort = %item_key.1, "update_item");
        Ok(UpdateAck {
            attributes: update.fields().clone(),
        })
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &GeneratedKey,
        condition: WriteCondition,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let table_state = table_mut(&mut tables, table)?;
        let item_key = table_state.request_key(key).map_err(rejected)?;

        if !condition.holds(table_state.items.get(&item_key)) {
            return Err(StoreError::ConditionFailed);
        }

        tracing::trace!(table, partition = %item_key.0, sort = %item_key.1, "delete_item");
        table_state.items.remove(&item_key);
        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        condition: &KeyCondition,
    ) -> Result<Vec<AttributeMapping>, StoreError> {
        let tables = self.tables.read().await;
        let table_state = table_ref(&tables, table)?;

        if condition.partition_attribute != table_state.partition_key {
            return Err(rejected(InMemoryError::Validation(format!(
                "query must target partition key {}",
                table_state.partition_key
            ))));
        }
        if condition.partition_value.is_empty() {
            return Err(rejected(InMemoryError::Validation(
                "partition value cannot be an empty string".to_string(),
            )));
        }
        if let Some(sort) = &condition.sort {
            if sort.attribute != table_state.sort_key {
                return Err(rejected(InMemoryError::Validation(format!(
                    "sort condition must target sort key {}",
                    table_state.sort_key
                ))));
            }
        }

        let partition = condition.partition_value.clone();
        let items: Vec<AttributeMapping> = table_state
            .items
            .range((partition.clone(), String::new())..)
            .take_while(|((p, _), _)| *p == partition)
            .map(|(_, item)| item)
            .filter(|item| condition.matches(item))
            .cloned()
            .collect();

        tracing::trace!(table, partition = %partition, count = items.len(), "query");
        Ok(items)
    }
}
