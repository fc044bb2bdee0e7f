//! SET-style update expressions.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::attributes::AttributeMapping;

/// Sets each named field to a new value; all other attributes stay untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    fields: AttributeMapping,
}

/// An update expression rendered with placeholder names and values.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedUpdate {
    pub expression: String,
    /// Placeholder name (`#attr0`) to attribute name.
    pub names: BTreeMap<String, String>,
    /// Placeholder value (`:val0`) to new value.
    pub values: BTreeMap<String, Value>,
}

impl UpdateExpression {
    pub fn set(fields: AttributeMapping) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &AttributeMapping {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders `SET #attr0 = :val0, #attr1 = :val1, ...`.
    pub fn render(&self) -> RenderedUpdate {
        let mut clauses = Vec::with_capacity(self.fields.len());
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();

        for (i, (field, value)) in self.fields.iter().enumerate() {
            let name = format!("#attr{i}");
            let placeholder = format!(":val{i}");
            clauses.push(format!("{name} = {placeholder}"));
            names.insert(name, field.clone());
            values.insert(placeholder, value.clone());
        }

        RenderedUpdate {
            expression: format!("SET {}", clauses.join(", ")),
            names,
            values,
        }
    }

    /// Applies the assignments to `item` in place.
    pub fn apply(&self, item: &mut AttributeMapping) {
        for (field, value) in &self.fields {
            item.insert(field.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> AttributeMapping {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_render_single_field() {
        let update = UpdateExpression::set(mapping(json!({"name": "Ann"})));
        let rendered = update.render();

        assert_eq!(rendered.expression, "SET #attr0 = :val0");
        assert_eq!(rendered.names.get("#attr0").map(String::as_str), Some("name"));
        assert_eq!(rendered.values.get(":val0"), Some(&json!("Ann")));
    }

    #[test]
    fn test_render_multiple_fields() {
        let update = UpdateExpression::set(mapping(json!({"age": 31, "name": "Ann"})));
        let rendered = update.render();

        assert_eq!(rendered.expression, "SET #attr0 = :val0, #attr1 = :val1");
        assert_eq!(rendered.names.len(), 2);
        assert_eq!(rendered.values.len(), 2);

        let assigned: BTreeMap<&str, &Value> = rendered
            .names
            .iter()
            .map(|(placeholder, field)| {
                let value_placeholder = placeholder.replace("#attr", ":val");
                (field.as_str(), rendered.values.get(&value_placeholder).unwrap())
            })
            .collect();
        assert_eq!(assigned.get("age"), Some(&&json!(31)));
        assert_eq!(assigned.get("name"), Some(&&json!("Ann")));
    }

    #[test]
    fn test_apply_only_touches_named_fields() {
        let mut item = mapping(json!({"PK": "p", "SK": "s", "name": "Ann", "age": 30}));
        UpdateExpression::set(mapping(json!({"age": 31, "city": null}))).apply(&mut item);

        assert_eq!(
            item,
            mapping(json!({"PK": "p", "SK": "s", "name": "Ann", "age": 31, "city": null}))
        );
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateExpression::default().is_empty());
    }
}
