//! Flat attribute mappings and the serde bridge to typed values.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DaoError, Result};

/// Field name to value mapping, as stored in one table item.
pub type AttributeMapping = Map<String, Value>;

/// Serializes a typed value into an attribute mapping.
///
/// The value must serialize to a JSON object; anything else is rejected.
pub fn to_mapping<T: Serialize + ?Sized>(value: &T) -> Result<AttributeMapping> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DaoError::Serialization(format!(
            "expected an object, got {}",
            kind(&other)
        ))),
    }
}

/// Deserializes an attribute mapping into a typed value.
pub fn from_mapping<T: DeserializeOwned>(attrs: AttributeMapping) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(attrs))?)
}

/// Renders a scalar the way it appears inside a generated key.
///
/// Strings are verbatim; everything else uses its compact JSON form.
pub fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Profile {
        id: String,
        age: u32,
        nickname: Option<String>,
    }

    #[test]
    fn test_to_mapping_keeps_nulls() {
        let profile = Profile {
            id: "42".to_string(),
            age: 30,
            nickname: None,
        };

        let attrs = to_mapping(&profile).unwrap();

        assert_eq!(attrs.get("id"), Some(&json!("42")));
        assert_eq!(attrs.get("age"), Some(&json!(30)));
        assert_eq!(attrs.get("nickname"), Some(&Value::Null));
    }

    #[test]
    fn test_from_mapping_builds_value() {
        let attrs = json!({"id": "7", "age": 21, "nickname": "sev"})
            .as_object()
            .cloned()
            .unwrap();

        let profile: Profile = from_mapping(attrs).unwrap();

        assert_eq!(
            profile,
            Profile {
                id: "7".to_string(),
                age: 21,
                nickname: Some("sev".to_string()),
            }
        );
    }

    #[test]
    fn test_to_mapping_rejects_non_objects() {
        let result = to_mapping(&"just a string");
        assert!(matches!(result, Err(DaoError::Serialization(msg)) if msg.contains("string")));
    }

    #[test]
    fn test_from_mapping_reports_missing_fields() {
        let attrs = json!({"id": "7"}).as_object().cloned().unwrap();
        let result: Result<Profile> = from_mapping(attrs);
        assert!(matches!(result, Err(DaoError::Serialization(_))));
    }

    #[test]
    fn test_key_string_forms() {
        assert_eq!(key_string(&json!("ACTIVE")), "ACTIVE");
        assert_eq!(key_string(&json!(42)), "42");
        assert_eq!(key_string(&json!(1.5)), "1.5");
        assert_eq!(key_string(&json!(true)), "true");
        assert_eq!(key_string(&json!(["a", 1])), r#"["a",1]"#);
    }
}
