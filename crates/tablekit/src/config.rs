use std::env;

use tablekit_core::TableSpec;

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Table name (default: "tablekit")
    pub table_name: String,
    /// Partition key attribute name (default: "PK")
    pub partition_key: String,
    /// Sort key attribute name (default: "SK")
    pub sort_key: String,
    /// Attribute recording the entity type on every item (default: unset)
    pub type_attribute: Option<String>,
    /// Custom endpoint URL, for local DynamoDB (default: unset)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABLEKIT_TABLE` - Table name (default: "tablekit")
    /// - `TABLEKIT_PARTITION_KEY` - Partition key attribute (default: "PK")
    /// - `TABLEKIT_SORT_KEY` - Sort key attribute (default: "SK")
    /// - `TABLEKIT_TYPE_ATTRIBUTE` - Entity type attribute (default: unset)
    /// - `AWS_ENDPOINT_URL` - DynamoDB endpoint override (default: unset)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            table_name: non_empty("TABLEKIT_TABLE").unwrap_or_else(|| "tablekit".to_string()),
            partition_key: non_empty("TABLEKIT_PARTITION_KEY").unwrap_or_else(|| "PK".to_string()),
            sort_key: non_empty("TABLEKIT_SORT_KEY").unwrap_or_else(|| "SK".to_string()),
            type_attribute: non_empty("TABLEKIT_TYPE_ATTRIBUTE"),
            endpoint_url: non_empty("AWS_ENDPOINT_URL"),
            region: non_empty("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        }
    }

    /// Table layout described by this configuration.
    pub fn table_spec(&self) -> TableSpec {
        let spec = TableSpec::new(&self.table_name)
            .with_partition_key(&self.partition_key)
            .with_sort_key(&self.sort_key);
        match &self.type_attribute {
            Some(attribute) => spec.with_type_attribute(attribute),
            None => spec,
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({url})"),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = StoreConfig::from_lookup(lookup(&[]));

        assert_eq!(config.table_name, "tablekit");
        assert_eq!(config.partition_key, "PK");
        assert_eq!(config.sort_key, "SK");
        assert_eq!(config.type_attribute, None);
        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("TABLEKIT_TABLE", "sessions"),
            ("TABLEKIT_PARTITION_KEY", "pk"),
            ("TABLEKIT_SORT_KEY", "sk"),
            ("TABLEKIT_TYPE_ATTRIBUTE", "entityType"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
            ("AWS_REGION", "eu-west-1"),
        ]));

        let spec = config.table_spec();
        assert_eq!(spec.name, "sessions");
        assert_eq!(spec.partition_key, "pk");
        assert_eq!(spec.sort_key, "sk");
        assert_eq!(spec.type_attribute.as_deref(), Some("entityType"));
        assert_eq!(config.target_display(), "Local DynamoDB (http://localhost:8000)");
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[("TABLEKIT_TABLE", ""), ("AWS_REGION", "")]));

        assert_eq!(config.table_name, "tablekit");
        assert_eq!(config.target_display(), "AWS DynamoDB (region: us-east-1)");
    }
}
