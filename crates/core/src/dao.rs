//! Typed data access over a single table.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::attributes::{self, AttributeMapping};
use crate::entity::Entity;
use crate::error::{DaoError, Result, StoreError};
use crate::keygen::GeneratedKey;
use crate::query::{KeyCondition, SortCondition};
use crate::schema::{KeySchema, TableSpec};
use crate::store::{StoreClient, UpdateAck, WriteCondition};
use crate::update::UpdateExpression;

/// Data access object for value type `V`, addressed by key shape `K`.
///
/// `K` is any serializable type carrying the fields the key rules reference;
/// often it is `V` itself or a smaller struct with optional trailing fields for
/// prefix queries. The DAO holds no state besides the client handle and the
/// table description, so it can be cloned and shared freely.
///
/// Single-item operations (`add`, `get`, `update`, `delete`) require every key
/// field to be non-null. Query operations truncate at the first null field.
pub struct Dao<K, V, S: ?Sized> {
    client: Arc<S>,
    spec: TableSpec,
    schema: KeySchema,
    _marker: PhantomData<fn(&K) -> V>,
}

impl<K, V, S: ?Sized> Clone for Dao<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            spec: self.spec.clone(),
            schema: self.schema.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, S> Dao<K, V, S>
where
    K: Serialize + Sync,
    V: Entity,
    S: StoreClient + ?Sized,
{
    pub fn new(client: Arc<S>, spec: TableSpec) -> Self {
        let schema = KeySchema::new(&spec, V::keygen_rules());
        Self {
            client,
            spec,
            schema,
            _marker: PhantomData,
        }
    }

    pub fn table(&self) -> &TableSpec {
        &self.spec
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    /// Stores `value`, failing with [`DaoError::AlreadyExists`] if its key is taken.
    pub async fn add(&self, value: &V) -> Result<()> {
        let mut item = value.to_attributes()?;
        let key = self.schema.complete_key(&item)?;
        item.extend(key.to_mapping());
        if let Some(type_attribute) = &self.spec.type_attribute {
            item.insert(type_attribute.clone(), V::type_name().into());
        }

        tracing::debug!(table = %self.spec.name, %key, entity = V::type_name(), "put_item");

        let condition = WriteCondition::AttributeNotExists(self.spec.partition_key.clone());
        match self.client.put_item(&self.spec.name, item, condition).await {
            Ok(()) => Ok(()),
            Err(StoreError::ConditionFailed) => Err(DaoError::AlreadyExists {
                entity_type: V::type_name(),
                key: key.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Fetches the value stored at `key`.
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        let key = self.item_key(key)?;

        tracing::debug!(table = %self.spec.name, %key, "get_item");

        match self.client.get_item(&self.spec.name, &key).await? {
            Some(item) => Ok(Some(self.decode(item)?)),
            None => Ok(None),
        }
    }

    /// Sets exactly the named `fields` on the item at `key`.
    ///
    /// Fails with [`DaoError::NotFound`] if no item exists there. Fields read by
    /// the key rules, the key attributes and the type attribute are rejected
    /// with [`DaoError::InvalidUpdate`], since changing them would leave the
    /// stored key out of step with the item.
    pub async fn update(&self, key: &K, fields: AttributeMapping) -> Result<UpdateAck> {
        if fields.is_empty() {
            return Err(DaoError::InvalidUpdate("no fields to set".to_string()));
        }
        if let Some(field) = fields.keys().find(|f| self.is_protected(f)) {
            return Err(DaoError::InvalidUpdate(format!(
                "{field} determines the item's key or type and cannot be updated"
            )));
        }
        let key = self.item_key(key)?;
        let update = UpdateExpression::set(fields);

        tracing::debug!(table = %self.spec.name, %key, fields = update.fields().len(), "update_item");

        let condition = WriteCondition::AttributeExists(self.spec.partition_key.clone());
        match self
            .client
            .update_item(&self.spec.name, &key, &update, condition)
            .await
        {
            Ok(ack) => Ok(ack),
            Err(StoreError::ConditionFailed) => Err(self.not_found(&key)),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes the item at `key`, failing with [`DaoError::NotFound`] if absent.
    pub async fn delete(&self, key: &K) -> Result<()> {
        let key = self.item_key(key)?;

        tracing::debug!(table = %self.spec.name, %key, "delete_item");

        let condition = WriteCondition::AttributeExists(self.spec.partition_key.clone());
        match self
            .client
            .delete_item(&self.spec.name, &key, condition)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::ConditionFailed) => Err(self.not_found(&key)),
            Err(err) => Err(err.into()),
        }
    }

    /// All items sharing the partition derived from `key`. The sort rule is ignored.
    pub async fn query_by_partition(&self, key: &K) -> Result<Vec<AttributeMapping>> {
        let attrs = attributes::to_mapping(key)?;
        let partition = self.schema.partition_value(&attrs)?;
        let condition = KeyCondition::partition(self.schema.partition_attribute(), partition);

        self.run_query(condition).await
    }

    /// Items in the partition of `key` whose sort key satisfies `condition`.
    ///
    /// `condition` receives the sort attribute name and the sort string derived
    /// from `key`, truncated at its first null field.
    pub async fn query_by_condition<F>(&self, key: &K, condition: F) -> Result<Vec<AttributeMapping>>
    where
        F: FnOnce(&str, &str) -> SortCondition,
    {
        let attrs = attributes::to_mapping(key)?;
        let partition = self.schema.partition_value(&attrs)?;
        let sort = self.schema.sort_value(&attrs)?;
        let sort_condition = condition(self.schema.sort_attribute(), &sort);
        let condition = KeyCondition::partition(self.schema.partition_attribute(), partition)
            .and_sort(sort_condition);

        self.run_query(condition).await
    }

    /// Items in the partition of `key` whose sort key begins with the derived prefix.
    pub async fn query_begins_with(&self, key: &K) -> Result<Vec<AttributeMapping>> {
        self.query_by_condition(key, |attribute, prefix| {
            SortCondition::begins_with(attribute, prefix)
        })
        .await
    }

    /// Converts raw query results into values.
    ///
    /// When the table has a type attribute, items of other value types sharing
    /// the partition are skipped. Any failure to decode an item of type `V` is
    /// an error.
    pub fn decode_items(&self, items: Vec<AttributeMapping>) -> Result<Vec<V>> {
        let total = items.len();
        let values = items
            .into_iter()
            .filter(|item| self.is_own_type(item))
            .map(|item| self.decode(item))
            .collect::<Result<Vec<V>>>()?;
        tracing::trace!(
            entity = V::type_name(),
            decoded = values.len(),
            skipped = total - values.len(),
            "decode_items"
        );
        Ok(values)
    }

    async fn run_query(&self, condition: KeyCondition) -> Result<Vec<AttributeMapping>> {
        tracing::debug!(
            table = %self.spec.name,
            partition = %condition.partition_value,
            sort = ?condition.sort,
            "query"
        );

        let items = self.client.query(&self.spec.name, &condition).await?;
        tracing::trace!(table = %self.spec.name, count = items.len(), "query returned");
        Ok(items)
    }

    fn item_key(&self, key: &K) -> Result<GeneratedKey> {
        let attrs = attributes::to_mapping(key)?;
        Ok(self.schema.complete_key(&attrs)?)
    }

    /// Decodes one item, rejecting items written for another value type.
    fn decode(&self, mut item: AttributeMapping) -> Result<V> {
        if let Some(type_attribute) = &self.spec.type_attribute {
            match item.remove(type_attribute) {
                Some(Value::String(found)) if found == V::type_name() => {}
                found => {
                    return Err(DaoError::TypeMismatch {
                        expected: V::type_name(),
                        found: found.map_or_else(
                            || format!("no {type_attribute} attribute"),
                            |value| attributes::key_string(&value),
                        ),
                    })
                }
            }
        }
        item.remove(self.schema.partition_attribute());
        item.remove(self.schema.sort_attribute());
        V::from_attributes(item)
    }

    fn is_own_type(&self, item: &AttributeMapping) -> bool {
        match &self.spec.type_attribute {
            Some(type_attribute) => {
                item.get(type_attribute).and_then(Value::as_str) == Some(V::type_name())
            }
            None => true,
        }
    }

    /// Key attributes, the type attribute and any field a key rule reads.
    fn is_protected(&self, field: &str) -> bool {
        self.schema.is_key_attribute(field)
            || self.schema.reads_field(field)
            || self.spec.type_attribute.as_deref() == Some(field)
    }

    fn not_found(&self, key: &GeneratedKey) -> DaoError {
        DaoError::NotFound {
            entity_type: V::type_name(),
            key: key.to_string(),
        }
    }
}
