//! The contract a value type fulfils to be stored through a [`crate::Dao`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::attributes::{self, AttributeMapping};
use crate::error::Result;
use crate::keygen::KeygenRules;

/// A value type stored in a single-table layout.
///
/// Serialization goes through `serde`; the key schema is static and shared by
/// every instance.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use tablekit_core::{key_rule, Entity, FieldToken, KeygenRules};
///
/// #[derive(Serialize, Deserialize)]
/// struct Profile {
///     id: String,
///     name: String,
/// }
///
/// static PROFILE_RULES: KeygenRules = KeygenRules::new(
///     key_rule![FieldToken::literal("USER"), FieldToken::field("id")],
///     key_rule![FieldToken::literal("PROFILE")],
/// );
///
/// impl Entity for Profile {
///     fn type_name() -> &'static str {
///         "Profile"
///     }
///
///     fn keygen_rules() -> &'static KeygenRules {
///         &PROFILE_RULES
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Name written to the table's type attribute, if one is configured.
    fn type_name() -> &'static str;

    /// Partition and sort rules for this type.
    fn keygen_rules() -> &'static KeygenRules;

    fn to_attributes(&self) -> Result<AttributeMapping> {
        attributes::to_mapping(self)
    }

    fn from_attributes(attrs: AttributeMapping) -> Result<Self> {
        attributes::from_mapping(attrs)
    }
}
