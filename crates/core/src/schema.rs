//! Table description and the binding of keygen rules to key attributes.

use crate::attributes::AttributeMapping;
use crate::error::KeygenResult;
use crate::keygen::{GeneratedKey, KeyRule, KeygenRules};

pub const DEFAULT_PARTITION_KEY: &str = "PK";
pub const DEFAULT_SORT_KEY: &str = "SK";

/// Physical description of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub partition_key: String,
    pub sort_key: String,
    /// Attribute holding the value type's name when several types share the table.
    pub type_attribute: Option<String>,
}

impl TableSpec {
    /// Creates a table spec with `PK`/`SK` key attributes and no type attribute.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            sort_key: DEFAULT_SORT_KEY.to_string(),
            type_attribute: None,
        }
    }

    pub fn with_partition_key(mut self, attribute: impl Into<String>) -> Self {
        self.partition_key = attribute.into();
        self
    }

    pub fn with_sort_key(mut self, attribute: impl Into<String>) -> Self {
        self.sort_key = attribute.into();
        self
    }

    pub fn with_type_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.type_attribute = Some(attribute.into());
        self
    }
}

/// Keygen rules paired with the table's key attributes.
///
/// The partition rule always maps to the partition attribute and the sort rule
/// to the sort attribute.
#[derive(Debug, Clone)]
pub struct KeySchema {
    partition_attribute: String,
    sort_attribute: String,
    rules: &'static KeygenRules,
}

impl KeySchema {
    pub fn new(spec: &TableSpec, rules: &'static KeygenRules) -> Self {
        Self {
            partition_attribute: spec.partition_key.clone(),
            sort_attribute: spec.sort_key.clone(),
            rules,
        }
    }

    pub fn partition_attribute(&self) -> &str {
        &self.partition_attribute
    }

    pub fn sort_attribute(&self) -> &str {
        &self.sort_attribute
    }

    pub fn rules(&self) -> &'static KeygenRules {
        self.rules
    }

    /// Partition string, truncated at the first null field.
    pub fn partition_value(&self, attrs: &AttributeMapping) -> KeygenResult<String> {
        self.rules.partition.render(attrs)
    }

    /// Sort string, truncated at the first null field.
    pub fn sort_value(&self, attrs: &AttributeMapping) -> KeygenResult<String> {
        self.rules.sort.render(attrs)
    }

    /// Both key strings, each truncated at its first null field.
    pub fn full_key(&self, attrs: &AttributeMapping) -> KeygenResult<GeneratedKey> {
        crate::keygen::generate(self.pairs(), attrs)
    }

    /// Both key strings; a null key field is an error.
    pub fn complete_key(&self, attrs: &AttributeMapping) -> KeygenResult<GeneratedKey> {
        let mut key = GeneratedKey::new();
        for (attribute, rule) in self.pairs() {
            key.insert(attribute, rule.render_complete(attrs)?);
        }
        Ok(key)
    }

    /// Whether `name` is one of the physical key attributes.
    pub fn is_key_attribute(&self, name: &str) -> bool {
        name == self.partition_attribute || name == self.sort_attribute
    }

    /// Whether either key rule reads the entity field `name`.
    pub fn reads_field(&self, name: &str) -> bool {
        self.rules
            .partition
            .field_names()
            .chain(self.rules.sort.field_names())
            .any(|field| field == name)
    }

    fn pairs(&self) -> [(&str, &KeyRule); 2] {
        [
            (self.partition_attribute.as_str(), &self.rules.partition),
            (self.sort_attribute.as_str(), &self.rules.sort),
        ]
    }
}
