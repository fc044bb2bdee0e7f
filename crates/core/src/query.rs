//! Key conditions for queries: partition equality AND an optional sort predicate.
//!
//! Conditions render to the DynamoDB key-condition syntax with placeholder
//! names and values, and can also be evaluated in-process against an item.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::attributes::AttributeMapping;

const PARTITION_NAME: &str = "#pk";
const PARTITION_VALUE: &str = ":pk";
const SORT_NAME: &str = "#sk";
const SORT_VALUE_LOW: &str = ":sk0";
const SORT_VALUE_HIGH: &str = ":sk1";

/// Predicate applied to the sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOp {
    Eq(String),
    Lt(String),
    Le(String),
    Gt(String),
    Ge(String),
    /// Inclusive on both ends.
    Between(String, String),
    BeginsWith(String),
}

/// A sort predicate bound to the sort key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCondition {
    pub attribute: String,
    pub op: SortOp,
}

impl SortCondition {
    pub fn new(attribute: impl Into<String>, op: SortOp) -> Self {
        Self {
            attribute: attribute.into(),
            op,
        }
    }

    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, SortOp::Eq(value.into()))
    }

    pub fn lt(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, SortOp::Lt(value.into()))
    }

    pub fn le(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, SortOp::Le(value.into()))
    }

    pub fn gt(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, SortOp::Gt(value.into()))
    }

    pub fn ge(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, SortOp::Ge(value.into()))
    }

    pub fn between(
        attribute: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self::new(attribute, SortOp::Between(low.into(), high.into()))
    }

    pub fn begins_with(attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::new(attribute, SortOp::BeginsWith(prefix.into()))
    }

    fn render(&self) -> (String, Vec<(&'static str, &str)>) {
        match &self.op {
            SortOp::Eq(v) => compare("=", v),
            SortOp::Lt(v) => compare("<", v),
            SortOp::Le(v) => compare("<=", v),
            SortOp::Gt(v) => compare(">", v),
            SortOp::Ge(v) => compare(">=", v),
            SortOp::Between(low, high) => (
                format!("{SORT_NAME} BETWEEN {SORT_VALUE_LOW} AND {SORT_VALUE_HIGH}"),
                vec![(SORT_VALUE_LOW, low.as_str()), (SORT_VALUE_HIGH, high.as_str())],
            ),
            SortOp::BeginsWith(prefix) => (
                format!("begins_with({SORT_NAME}, {SORT_VALUE_LOW})"),
                vec![(SORT_VALUE_LOW, prefix.as_str())],
            ),
        }
    }

    /// Evaluates the predicate with byte-wise string ordering.
    pub fn matches(&self, item: &AttributeMapping) -> bool {
        let Some(Value::String(actual)) = item.get(&self.attribute) else {
            return false;
        };
        let actual = actual.as_str();
        match &self.op {
            SortOp::Eq(v) => actual == v.as_str(),
            SortOp::Lt(v) => actual < v.as_str(),
            SortOp::Le(v) => actual <= v.as_str(),
            SortOp::Gt(v) => actual > v.as_str(),
            SortOp::Ge(v) => actual >= v.as_str(),
            SortOp::Between(low, high) => low.as_str() <= actual && actual <= high.as_str(),
            SortOp::BeginsWith(prefix) => actual.starts_with(prefix.as_str()),
        }
    }
}

fn compare<'a>(operator: &str, value: &'a str) -> (String, Vec<(&'static str, &'a str)>) {
    (
        format!("{SORT_NAME} {operator} {SORT_VALUE_LOW}"),
        vec![(SORT_VALUE_LOW, value)],
    )
}

/// Partition equality combined with an optional sort predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub partition_attribute: String,
    pub partition_value: String,
    pub sort: Option<SortCondition>,
}

impl KeyCondition {
    pub fn partition(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            partition_attribute: attribute.into(),
            partition_value: value.into(),
            sort: None,
        }
    }

    pub fn and_sort(mut self, condition: SortCondition) -> Self {
        self.sort = Some(condition);
        self
    }

    /// Renders the key-condition expression and its placeholder maps.
    pub fn to_expression(&self) -> KeyExpression {
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();

        names.insert(PARTITION_NAME.to_string(), self.partition_attribute.clone());
        values.insert(PARTITION_VALUE.to_string(), self.partition_value.clone());
        let mut expression = format!("{PARTITION_NAME} = {PARTITION_VALUE}");

        if let Some(sort) = &self.sort {
            let (clause, sort_values) = sort.render();
            names.insert(SORT_NAME.to_string(), sort.attribute.clone());
            for (placeholder, value) in sort_values {
                values.insert(placeholder.to_string(), value.to_string());
            }
            expression.push_str(" AND ");
            expression.push_str(&clause);
        }

        KeyExpression {
            expression,
            names,
            values,
        }
    }

    /// Whether `item` satisfies the whole condition.
    pub fn matches(&self, item: &AttributeMapping) -> bool {
        let partition_matches = matches!(
            item.get(&self.partition_attribute),
            Some(Value::String(actual)) if *actual == self.partition_value
        );
        partition_matches && self.sort.as_ref().is_none_or(|sort| sort.matches(item))
    }
}

/// A rendered key-condition expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExpression {
    pub expression: String,
    /// Placeholder name (`#pk`) to attribute name.
    pub names: BTreeMap<String, String>,
    /// Placeholder value (`:pk`) to string value.
    pub values: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> AttributeMapping {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_partition_only_expression() {
        let expr = KeyCondition::partition("PK", "USER#id#42").to_expression();

        assert_eq!(expr.expression, "#pk = :pk");
        assert_eq!(expr.names.get("#pk").map(String::as_str), Some("PK"));
        assert_eq!(expr.values.get(":pk").map(String::as_str), Some("USER#id#42"));
        assert!(!expr.names.contains_key("#sk"));
    }

    #[test]
    fn test_begins_with_expression() {
        let expr = KeyCondition::partition("PK", "USER#id#42")
            .and_sort(SortCondition::begins_with("SK", "status#ACTIVE"))
            .to_expression();

        assert_eq!(expr.expression, "#pk = :pk AND begins_with(#sk, :sk0)");
        assert_eq!(expr.names.get("#sk").map(String::as_str), Some("SK"));
        assert_eq!(expr.values.get(":sk0").map(String::as_str), Some("status#ACTIVE"));
    }

    #[test]
    fn test_comparison_expressions() {
        let cases = [
            (SortCondition::eq("SK", "a"), "#pk = :pk AND #sk = :sk0"),
            (SortCondition::lt("SK", "a"), "#pk = :pk AND #sk < :sk0"),
            (SortCondition::le("SK", "a"), "#pk = :pk AND #sk <= :sk0"),
            (SortCondition::gt("SK", "a"), "#pk = :pk AND #sk > :sk0"),
            (SortCondition::ge("SK", "a"), "#pk = :pk AND #sk >= :sk0"),
        ];

        for (sort, expected) in cases {
            let expr = KeyCondition::partition("PK", "p").and_sort(sort).to_expression();
            assert_eq!(expr.expression, expected);
            assert_eq!(expr.values.len(), 2);
        }
    }

    #[test]
    fn test_between_expression() {
        let expr = KeyCondition::partition("PK", "p")
            .and_sort(SortCondition::between("SK", "ts#100", "ts#200"))
            .to_expression();

        assert_eq!(expr.expression, "#pk = :pk AND #sk BETWEEN :sk0 AND :sk1");
        assert_eq!(expr.values.get(":sk0").map(String::as_str), Some("ts#100"));
        assert_eq!(expr.values.get(":sk1").map(String::as_str), Some("ts#200"));
    }

    #[test]
    fn test_matches_partition() {
        let condition = KeyCondition::partition("PK", "USER#id#1");

        assert!(condition.matches(&item(json!({"PK": "USER#id#1", "SK": "x"}))));
        assert!(!condition.matches(&item(json!({"PK": "USER#id#10", "SK": "x"}))));
        assert!(!condition.matches(&item(json!({"SK": "x"}))));
    }

    #[test]
    fn test_matches_begins_with() {
        let condition = KeyCondition::partition("PK", "p")
            .and_sort(SortCondition::begins_with("SK", "status#ACTIVE"));

        assert!(condition.matches(&item(json!({"PK": "p", "SK": "status#ACTIVE#ts#5"}))));
        assert!(!condition.matches(&item(json!({"PK": "p", "SK": "status#CLOSED#ts#5"}))));
        assert!(!condition.matches(&item(json!({"PK": "q", "SK": "status#ACTIVE"}))));
    }

    #[test]
    fn test_matches_ordering() {
        let sk = |v: &str| item(json!({"PK": "p", "SK": v}));

        assert!(SortCondition::lt("SK", "b").matches(&sk("a")));
        assert!(!SortCondition::lt("SK", "b").matches(&sk("b")));
        assert!(SortCondition::le("SK", "b").matches(&sk("b")));
        assert!(SortCondition::gt("SK", "b").matches(&sk("c")));
        assert!(SortCondition::ge("SK", "b").matches(&sk("b")));
        assert!(SortCondition::between("SK", "b", "d").matches(&sk("d")));
        assert!(!SortCondition::between("SK", "b", "d").matches(&sk("e")));
        assert!(SortCondition::eq("SK", "b").matches(&sk("b")));
    }

    #[test]
    fn test_non_string_sort_never_matches() {
        let condition = SortCondition::ge("SK", "0");
        assert!(!condition.matches(&item(json!({"SK": 5}))));
    }
}
