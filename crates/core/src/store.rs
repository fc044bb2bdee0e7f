//! The store-client capability set consumed by the DAO.

use async_trait::async_trait;

use crate::attributes::AttributeMapping;
use crate::error::StoreError;
use crate::keygen::GeneratedKey;
use crate::query::KeyCondition;
use crate::update::UpdateExpression;

/// Existence predicate attached to a single-item write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// `attribute_not_exists(<attribute>)`: the item must not exist yet.
    AttributeNotExists(String),
    /// `attribute_exists(<attribute>)`: the item must already exist.
    AttributeExists(String),
}

impl WriteCondition {
    /// Renders the condition expression for `attribute` bound to `#cond`.
    pub fn expression(&self) -> &'static str {
        match self {
            Self::AttributeNotExists(_) => "attribute_not_exists(#cond)",
            Self::AttributeExists(_) => "attribute_exists(#cond)",
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Self::AttributeNotExists(attribute) | Self::AttributeExists(attribute) => attribute,
        }
    }

    /// Evaluates the condition against the current item, if any.
    pub fn holds(&self, current: Option<&AttributeMapping>) -> bool {
        let exists = current.is_some_and(|item| item.contains_key(self.attribute()));
        match self {
            Self::AttributeNotExists(_) => !exists,
            Self::AttributeExists(_) => exists,
        }
    }
}

/// Backend acknowledgement of an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateAck {
    /// Attribute values written by the update, as reported by the backend.
    pub attributes: AttributeMapping,
}

/// Single-item and query operations against one table.
///
/// Each method performs one physical request. Conditions are evaluated
/// atomically by the backend for the addressed item; a failed condition is
/// reported as [`StoreError::ConditionFailed`].
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Writes `item` if `condition` holds.
    async fn put_item(
        &self,
        table: &str,
        item: AttributeMapping,
        condition: WriteCondition,
    ) -> Result<(), StoreError>;

    /// Fetches the item at exactly `key`.
    async fn get_item(
        &self,
        table: &str,
        key: &GeneratedKey,
    ) -> Result<Option<AttributeMapping>, StoreError>;

    /// Applies `update` to the item at `key` if `condition` holds.
    async fn update_item(
        &self,
        table: &str,
        key: &GeneratedKey,
        update: &UpdateExpression,
        condition: WriteCondition,
    ) -> Result<UpdateAck, StoreError>;

    /// Removes the item at `key` if `condition` holds.
    async fn delete_item(
        &self,
        table: &str,
        key: &GeneratedKey,
        condition: WriteCondition,
    ) -> Result<(), StoreError>;

    /// Returns all items matching `condition`, in store order.
    async fn query(
        &self,
        table: &str,
        condition: &KeyCondition,
    ) -> Result<Vec<AttributeMapping>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_expressions() {
        let not_exists = WriteCondition::AttributeNotExists("PK".to_string());
        let exists = WriteCondition::AttributeExists("PK".to_string());

        assert_eq!(not_exists.expression(), "attribute_not_exists(#cond)");
        assert_eq!(exists.expression(), "attribute_exists(#cond)");
        assert_eq!(exists.attribute(), "PK");
    }

    #[test]
    fn test_condition_holds() {
        let item = json!({"PK": "p", "SK": "s"}).as_object().cloned().unwrap();
        let not_exists = WriteCondition::AttributeNotExists("PK".to_string());
        let exists = WriteCondition::AttributeExists("PK".to_string());

        assert!(not_exists.holds(None));
        assert!(!not_exists.holds(Some(&item)));
        assert!(exists.holds(Some(&item)));
        assert!(!exists.holds(None));
    }
}
