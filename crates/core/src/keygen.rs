//! Key rule engine.
//!
//! Turns an ordered list of literals and field references into a composite key
//! string. Pure functions only: the same rule and attributes always produce the
//! same key.
//!
//! A field reference contributes two segments, the field name and its value, so
//! the rule `[!USER, id]` over `{"id": "42"}` renders as `USER#id#42`. A field
//! whose value is null ends the rule early, which is how query prefixes are
//! built: leave the trailing key fields null and the remaining string can be
//! used with `begins_with`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::attributes::{key_string, AttributeMapping};
use crate::error::{KeygenError, KeygenResult};

/// Separator placed between key segments.
pub const KEY_SEPARATOR: &str = "#";

/// Marks a literal token in the textual rule form (`!USER`).
const LITERAL_MARKER: char = '!';

/// Separates tokens in the textual rule form (`!USER,id`).
const TOKEN_DELIMITER: char = ',';

// ============================================================================
// Tokens
// ============================================================================

/// One element of a key rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldToken {
    /// Fixed text, emitted as-is.
    Literal(Cow<'static, str>),
    /// Attribute looked up in the entity's mapping.
    Field(Cow<'static, str>),
}

impl FieldToken {
    pub const fn literal(text: &'static str) -> Self {
        Self::Literal(Cow::Borrowed(text))
    }

    pub const fn field(name: &'static str) -> Self {
        Self::Field(Cow::Borrowed(name))
    }
}

impl FromStr for FieldToken {
    type Err = KeygenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token.strip_prefix(LITERAL_MARKER) {
            Some("") => Err(KeygenError::InvalidToken(s.to_string())),
            Some(text) => Ok(Self::Literal(Cow::Owned(text.to_string()))),
            None if token.is_empty() => Err(KeygenError::InvalidToken(s.to_string())),
            None => Ok(Self::Field(Cow::Owned(token.to_string()))),
        }
    }
}

impl fmt::Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{LITERAL_MARKER}{text}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Ordered token list producing one key string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRule {
    tokens: Cow<'static, [FieldToken]>,
}

impl KeyRule {
    /// Builds a rule from a static token slice. See [`key_rule!`](crate::key_rule).
    pub const fn new(tokens: &'static [FieldToken]) -> Self {
        Self {
            tokens: Cow::Borrowed(tokens),
        }
    }

    pub fn from_tokens(tokens: Vec<FieldToken>) -> Self {
        Self {
            tokens: Cow::Owned(tokens),
        }
    }

    /// Parses tokens in textual form, e.g. `["!USER", "id"]`.
    pub fn parse<I, S>(tokens: I) -> KeygenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|token| token.as_ref().parse())
            .collect::<KeygenResult<Vec<FieldToken>>>()?;
        Ok(Self::from_tokens(tokens))
    }

    pub fn tokens(&self) -> &[FieldToken] {
        &self.tokens
    }

    /// Names of all fields this rule reads, in rule order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            FieldToken::Field(name) => Some(name.as_ref()),
            FieldToken::Literal(_) => None,
        })
    }

    /// Renders the rule, stopping at the first null field.
    pub fn render(&self, attrs: &AttributeMapping) -> KeygenResult<String> {
        self.evaluate(attrs, false)
    }

    /// Renders the rule, treating a null field as an error.
    ///
    /// Used where a truncated key would silently address a different item.
    pub fn render_complete(&self, attrs: &AttributeMapping) -> KeygenResult<String> {
        self.evaluate(attrs, true)
    }

    fn evaluate(&self, attrs: &AttributeMapping, complete: bool) -> KeygenResult<String> {
        let mut parts: Vec<Cow<'_, str>> = Vec::with_capacity(self.tokens.len() * 2);

        for token in self.tokens.iter() {
            match token {
                FieldToken::Literal(text) => parts.push(Cow::Borrowed(text.as_ref())),
                FieldToken::Field(name) => match attrs.get(&**name) {
                    None => {
                        return Err(KeygenError::MissingField {
                            field: name.to_string(),
                        })
                    }
                    Some(Value::Null) if complete => {
                        return Err(KeygenError::IncompleteKey {
                            field: name.to_string(),
                        })
                    }
                    Some(Value::Null) => break,
                    Some(value) => {
                        parts.push(Cow::Borrowed(name.as_ref()));
                        parts.push(Cow::Owned(key_string(value)));
                    }
                },
            }
        }

        Ok(parts.join(KEY_SEPARATOR))
    }
}

impl FromStr for KeyRule {
    type Err = KeygenError;

    /// Parses a comma separated rule such as `!USER,id`. An empty string is an
    /// empty rule.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::from_tokens(Vec::new()));
        }
        Self::parse(s.split(TOKEN_DELIMITER))
    }
}

impl fmt::Display for KeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, "{TOKEN_DELIMITER}")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Builds a [`KeyRule`] from constant tokens, usable in `static` items.
///
/// ```
/// use tablekit_core::{key_rule, FieldToken, KeyRule};
///
/// static USER_PK: KeyRule = key_rule![FieldToken::literal("USER"), FieldToken::field("id")];
/// assert_eq!(USER_PK.to_string(), "!USER,id");
/// ```
#[macro_export]
macro_rules! key_rule {
    ($($token:expr),* $(,)?) => {{
        const TOKENS: &[$crate::FieldToken] = &[$($token),*];
        $crate::KeyRule::new(TOKENS)
    }};
}

/// Partition and sort rules owned by a value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeygenRules {
    pub partition: KeyRule,
    pub sort: KeyRule,
}

impl KeygenRules {
    pub const fn new(partition: KeyRule, sort: KeyRule) -> Self {
        Self { partition, sort }
    }
}

// ============================================================================
// Generated keys
// ============================================================================

/// Physical key attribute names mapped to their derived strings, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedKey(Vec<(String, String)>);

impl GeneratedKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `attribute` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        let attribute = attribute.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == attribute) {
            Some(entry) => entry.1 = value,
            None => self.0.push((attribute, value)),
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the key into attribute values, e.g. to merge into an item.
    pub fn to_mapping(&self) -> AttributeMapping {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }
}

impl fmt::Display for GeneratedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

impl IntoIterator for GeneratedKey {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Renders every `(attribute, rule)` pair against `attrs`.
///
/// Null fields truncate their rule; absent fields fail the whole call.
pub fn generate<'a, I>(rules: I, attrs: &AttributeMapping) -> KeygenResult<GeneratedKey>
where
    I: IntoIterator<Item = (&'a str, &'a KeyRule)>,
{
    let mut key = GeneratedKey::new();
    for (attribute, rule) in rules {
        key.insert(attribute, rule.render(attrs)?);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static USER_PK: KeyRule = key_rule![FieldToken::literal("USER"), FieldToken::field("id")];
    static PROFILE_SK: KeyRule = key_rule![FieldToken::literal("PROFILE")];
    static STATUS_SK: KeyRule = key_rule![FieldToken::field("status"), FieldToken::field("ts")];

    fn attrs(value: serde_json::Value) -> AttributeMapping {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_literal_and_field_tokens() {
        let key = generate(
            [("PK", &USER_PK), ("SK", &PROFILE_SK)],
            &attrs(json!({"id": "42"})),
        )
        .unwrap();

        assert_eq!(key.get("PK"), Some("USER#id#42"));
        assert_eq!(key.get("SK"), Some("PROFILE"));
    }

    #[test]
    fn test_null_field_truncates_rule() {
        let sk = STATUS_SK
            .render(&attrs(json!({"status": "ACTIVE", "ts": null})))
            .unwrap();
        assert_eq!(sk, "status#ACTIVE");
    }

    #[test]
    fn test_null_field_skips_trailing_literals() {
        let rule: KeyRule = "!ORDER,date,!LINE,line".parse().unwrap();
        let key = rule
            .render(&attrs(json!({"date": null, "line": 3})))
            .unwrap();
        assert_eq!(key, "ORDER");
    }

    #[test]
    fn test_truncation_matches_shorter_rule() {
        let full: KeyRule = "!EVT,kind,ts,!TAIL".parse().unwrap();
        let prefix: KeyRule = "!EVT,kind".parse().unwrap();
        let values = attrs(json!({"kind": "click", "ts": null}));

        assert_eq!(full.render(&values).unwrap(), prefix.render(&values).unwrap());
    }

    #[test]
    fn test_leading_null_yields_empty_string() {
        let key = STATUS_SK
            .render(&attrs(json!({"status": null, "ts": 5})))
            .unwrap();
        assert_eq!(key, "");
    }

    #[test]
    fn test_empty_rule_yields_empty_string() {
        let rule: KeyRule = "".parse().unwrap();
        assert_eq!(rule.render(&AttributeMapping::new()).unwrap(), "");
    }

    #[test]
    fn test_missing_field_fails() {
        let result = USER_PK.render(&attrs(json!({"name": "ann"})));
        assert_eq!(
            result,
            Err(KeygenError::MissingField {
                field: "id".to_string()
            })
        );
    }

    #[test]
    fn test_missing_field_after_null_is_not_reached() {
        let rule: KeyRule = "a,b".parse().unwrap();
        assert_eq!(rule.render(&attrs(json!({"a": null}))).unwrap(), "");
    }

    #[test]
    fn test_render_complete_rejects_null() {
        let result = STATUS_SK.render_complete(&attrs(json!({"status": "ACTIVE", "ts": null})));
        assert_eq!(
            result,
            Err(KeygenError::IncompleteKey {
                field: "ts".to_string()
            })
        );
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let rule: KeyRule = "n,flag,ratio".parse().unwrap();
        let key = rule
            .render(&attrs(json!({"n": 7, "flag": false, "ratio": 0.25})))
            .unwrap();
        assert_eq!(key, "n#7#flag#false#ratio#0.25");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let values = attrs(json!({"id": "9", "status": "NEW", "ts": 100}));
        let rules = [("PK", &USER_PK), ("SK", &STATUS_SK)];

        let first = generate(rules, &values).unwrap();
        let second = generate(rules, &values).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.get("SK"), Some("status#NEW#ts#100"));
    }

    #[test]
    fn test_token_parsing() {
        assert_eq!(
            "!USER".parse::<FieldToken>().unwrap(),
            FieldToken::literal("USER")
        );
        assert_eq!(" id ".parse::<FieldToken>().unwrap(), FieldToken::field("id"));
        assert!(matches!(
            "!".parse::<FieldToken>(),
            Err(KeygenError::InvalidToken(_))
        ));
        assert!(matches!(
            "".parse::<FieldToken>(),
            Err(KeygenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rule_display_round_trips_text() {
        let rule: KeyRule = "!USER,id".parse().unwrap();
        assert_eq!(rule.to_string(), "!USER,id");
        assert_eq!(rule, USER_PK);
    }

    #[test]
    fn test_rule_rejects_empty_token() {
        assert!(matches!(
            "!USER,,id".parse::<KeyRule>(),
            Err(KeygenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_field_names() {
        let names: Vec<&str> = STATUS_SK.field_names().collect();
        assert_eq!(names, vec!["status", "ts"]);
        assert_eq!(PROFILE_SK.field_names().count(), 0);
    }

    #[test]
    fn test_generated_key_display_and_mapping() {
        let mut key = GeneratedKey::new();
        key.insert("PK", "USER#id#1");
        key.insert("SK", "PROFILE");
        key.insert("PK", "USER#id#2");

        assert_eq!(key.len(), 2);
        assert_eq!(key.to_string(), "PK=USER#id#2, SK=PROFILE");
        assert_eq!(key.to_mapping().get("PK"), Some(&json!("USER#id#2")));
    }
}
