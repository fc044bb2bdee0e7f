//! DynamoDB store client.
//!
//! Implements `tablekit_core::StoreClient` with one SDK request per call.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use tracing::{debug, warn};

use tablekit_core::{
    AttributeMapping, GeneratedKey, KeyCondition, StoreClient, StoreError, UpdateAck,
    UpdateExpression, WriteCondition,
};

use super::conversions::{from_item, key_to_item, to_attribute_value, to_item};
use super::error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_query_error,
    map_update_item_error,
};

/// Placeholder bound to the attribute named by a [`WriteCondition`].
const CONDITION_NAME: &str = "#cond";

/// DynamoDB-backed [`StoreClient`].
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a store over an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn condition_names(condition: &WriteCondition) -> HashMap<String, String> {
    HashMap::from([(
        CONDITION_NAME.to_string(),
        condition.attribute().to_string(),
    )])
}

#[async_trait]
impl StoreClient for DynamoDbStore {
    async fn put_item(
        &self,
        table: &str,
        item: AttributeMapping,
        condition: WriteCondition,
    ) -> Result<(), StoreError> {
        debug!(table, condition = condition.expression(), "PutItem");

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(&item)))
            .condition_expression(condition.expression())
            .set_expression_attribute_names(Some(condition_names(&condition)))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: &GeneratedKey,
    ) -> Result<Option<AttributeMapping>, StoreError> {
        debug!(table, %key, "GetItem");

        let result = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(from_item).transpose()
    }

    async fn update_item(
        &self,
        table: &str,
        key: &GeneratedKey,
        update: &UpdateExpression,
        condition: WriteCondition,
    ) -> Result<UpdateAck, StoreError> {
        let rendered = update.render();
        debug!(table, %key, expression = %rendered.expression, "UpdateItem");

        let mut names = condition_names(&condition);
        names.extend(rendered.names);
        let values: HashMap<String, AttributeValue> = rendered
            .values
            .iter()
            .map(|(placeholder, value)| (placeholder.clone(), to_attribute_value(value)))
            .collect();

        let result = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(key_to_item(key)))
            .update_expression(rendered.expression)
            .condition_expression(condition.expression())
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_update_item_error)?;

        let attributes = match result.attributes.as_ref() {
            Some(item) => from_item(item)?,
            None => AttributeMapping::new(),
        };
        Ok(UpdateAck { attributes })
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &GeneratedKey,
        condition: WriteCondition,
    ) -> Result<(), StoreError> {
        debug!(table, %key, condition = condition.expression(), "DeleteItem");

        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key_to_item(key)))
            .condition_expression(condition.expression())
            .set_expression_attribute_names(Some(condition_names(&condition)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        condition: &KeyCondition,
    ) -> Result<Vec<AttributeMapping>, StoreError> {
        let expression = condition.to_expression();
        debug!(table, expression = %expression.expression, "Query");

        let names: HashMap<String, String> = expression.names.into_iter().collect();
        let values: HashMap<String, AttributeValue> = expression
            .values
            .into_iter()
            .map(|(placeholder, value)| (placeholder, AttributeValue::S(value)))
            .collect();

        let result = self
            .client
            .query()
            .table_name(table)
            .key_condition_expression(expression.expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(map_query_error)?;

        if result.last_evaluated_key.is_some() {
            warn!(
                table,
                partition = %condition.partition_value,
                "Query result truncated to the first page"
            );
        }

        result.items.unwrap_or_default().iter().map(from_item).collect()
    }
}
