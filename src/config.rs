//! Serialization configuration
//!
//! A [`SerializationConfig`] is built once, wrapped in an `Arc`, and shared by
//! every column that uses it. There is no way to mutate a config after
//! `build()`; a logically different configuration is a different instance.

use crate::error::{Error, Result};
use crate::naming::{ConvertName, NamingPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// When struct fields are left out of the written document.
///
/// Defaults are judged on the written JSON value: `null`, `false` and numeric
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IgnoreCondition {
    #[default]
    Never,
    WhenWritingNull,
    WhenWritingDefault,
}

/// Type-specific value transforms applied on top of the serde data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueTransform {
    /// Apply the naming policy to enum variant names.
    EnumVariantNaming,
    /// Write numbers as JSON strings (implies `NumbersFromStrings`).
    NumbersAsStrings,
    /// Accept numbers encoded as JSON strings when reading.
    NumbersFromStrings,
}

/// Explicit JSON name for one field.
///
/// An override with an `owner` applies only to fields of that struct (or
/// struct variant); without one it applies to the field wherever it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNameOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub field: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationConfig {
    naming_policy: Option<NamingPolicy>,
    ignore_condition: IgnoreCondition,
    field_names: Vec<FieldNameOverride>,
    transforms: BTreeSet<ValueTransform>,
    case_insensitive_names: bool,
    write_indented: bool,
}

impl SerializationConfig {
    pub fn builder() -> SerializationConfigBuilder {
        SerializationConfigBuilder::default()
    }

    /// camelCase names, case-insensitive reads, numbers readable from strings.
    pub fn web() -> Self {
        Self::builder()
            .naming_policy(NamingPolicy::CamelCase)
            .case_insensitive_names(true)
            .transform(ValueTransform::NumbersFromStrings)
            .build()
    }

    pub fn naming_policy(&self) -> Option<&NamingPolicy> {
        self.naming_policy.as_ref()
    }

    pub fn ignore_condition(&self) -> IgnoreCondition {
        self.ignore_condition
    }

    pub fn field_names(&self) -> &[FieldNameOverride] {
        &self.field_names
    }

    pub fn has_transform(&self, transform: ValueTransform) -> bool {
        self.transforms.contains(&transform)
    }

    pub fn case_insensitive_names(&self) -> bool {
        self.case_insensitive_names
    }

    pub fn write_indented(&self) -> bool {
        self.write_indented
    }

    /// Explicit override for `field` of `owner`; owner-scoped overrides win.
    pub fn field_override(&self, owner: &str, field: &str) -> Option<&str> {
        let mut global = None;
        for entry in self.field_names.iter().filter(|entry| entry.field == field) {
            match entry.owner.as_deref() {
                Some(scope) if scope == owner => return Some(entry.name.as_str()),
                None if global.is_none() => global = Some(entry.name.as_str()),
                _ => {}
            }
        }
        global
    }

    /// Name derived from configuration alone: override, then naming policy.
    /// `None` when neither applies.
    pub fn configured_name(&self, owner: &str, field: &str) -> Option<String> {
        if let Some(name) = self.field_override(owner, field) {
            return Some(name.to_owned());
        }
        self.naming_policy.as_ref().map(|policy| policy.apply(field))
    }

    /// Name written to the document; the identifier itself when nothing is
    /// configured.
    pub fn wire_name(&self, owner: &str, field: &str) -> String {
        self.configured_name(owner, field)
            .unwrap_or_else(|| field.to_owned())
    }

    /// Identifier for a stored key read without a declared field list, as
    /// happens under internally tagged enums and flattened structs.
    ///
    /// A key matching an override's name maps to that field. A key the
    /// naming policy produces from a snake_case identifier maps back to it.
    /// Anything else is kept as stored.
    pub fn restore_name(&self, stored: &str) -> String {
        let overridden = self.field_names.iter().find(|entry| {
            if self.case_insensitive_names {
                entry.name.eq_ignore_ascii_case(stored)
            } else {
                entry.name == stored
            }
        });
        if let Some(entry) = overridden {
            return entry.field.clone();
        }
        if let Some(policy) = &self.naming_policy {
            let identifier = NamingPolicy::SnakeCaseLower.apply(stored);
            if policy.apply(&identifier) == stored {
                return identifier;
            }
        }
        stored.to_owned()
    }

    pub fn variant_name(&self, variant: &str) -> String {
        match &self.naming_policy {
            Some(policy) if self.has_transform(ValueTransform::EnumVariantNaming) => {
                policy.apply(variant)
            }
            _ => variant.to_owned(),
        }
    }

    pub fn writes_numbers_as_strings(&self) -> bool {
        self.has_transform(ValueTransform::NumbersAsStrings)
    }

    pub fn reads_numbers_from_strings(&self) -> bool {
        self.has_transform(ValueTransform::NumbersAsStrings)
            || self.has_transform(ValueTransform::NumbersFromStrings)
    }

    /// Whether a struct field holding `value` is left out of the document.
    pub fn should_omit(&self, value: &JsonValue) -> bool {
        match self.ignore_condition {
            IgnoreCondition::Never => false,
            IgnoreCondition::WhenWritingNull => value.is_null(),
            IgnoreCondition::WhenWritingDefault => match value {
                JsonValue::Null => true,
                JsonValue::Bool(b) => !*b,
                JsonValue::Number(n) => n.as_f64() == Some(0.0),
                _ => false,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.field_names {
            if entry.field.is_empty() || entry.name.is_empty() {
                return Err(Error::InvalidConfig(
                    "Field name overrides need a field and a name".to_string(),
                ));
            }
            if !seen.insert((entry.owner.as_deref(), entry.field.as_str())) {
                return Err(Error::InvalidConfig(format!(
                    "Field '{}' has more than one name override",
                    entry.field
                )));
            }
        }
        Ok(())
    }

    /// Loads a config from JSON text and validates it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl ConvertName for SerializationConfig {
    fn convert_name(&self, owner: &str, field: &str) -> Option<String> {
        self.configured_name(owner, field)
    }
}

/// Builder for [`SerializationConfig`]
#[derive(Debug, Default)]
pub struct SerializationConfigBuilder {
    config: SerializationConfig,
}

impl SerializationConfigBuilder {
    /// Set the naming policy
    pub fn naming_policy(mut self, policy: NamingPolicy) -> Self {
        self.config.naming_policy = Some(policy);
        self
    }

    /// Set the null/default omission rule
    pub fn ignore_condition(mut self, condition: IgnoreCondition) -> Self {
        self.config.ignore_condition = condition;
        self
    }

    /// Give `field` an explicit JSON name wherever it appears
    pub fn rename_field(mut self, field: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.field_names.push(FieldNameOverride {
            owner: None,
            field: field.into(),
            name: name.into(),
        });
        self
    }

    /// Give `field` of struct `owner` an explicit JSON name
    pub fn rename_field_of(
        mut self,
        owner: impl Into<String>,
        field: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.config.field_names.push(FieldNameOverride {
            owner: Some(owner.into()),
            field: field.into(),
            name: name.into(),
        });
        self
    }

    /// Enable a value transform
    pub fn transform(mut self, transform: ValueTransform) -> Self {
        self.config.transforms.insert(transform);
        self
    }

    /// Match stored names ignoring case when reading
    pub fn case_insensitive_names(mut self, enabled: bool) -> Self {
        self.config.case_insensitive_names = enabled;
        self
    }

    /// Pretty-print written documents
    pub fn write_indented(mut self, enabled: bool) -> Self {
        self.config.write_indented = enabled;
        self
    }

    pub fn build(self) -> SerializationConfig {
        self.config
    }

    pub fn build_shared(self) -> Arc<SerializationConfig> {
        Arc::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = SerializationConfig::default();
        assert!(config.naming_policy().is_none());
        assert_eq!(config.ignore_condition(), IgnoreCondition::Never);
        assert_eq!(config.wire_name("Person", "Age"), "Age");
        assert_eq!(config.configured_name("Person", "Age"), None);
    }

    #[test]
    fn test_override_beats_policy() {
        let config = SerializationConfig::builder()
            .naming_policy(NamingPolicy::CamelCase)
            .rename_field("Attributes", "DEETZ")
            .build();

        assert_eq!(config.wire_name("Person", "Attributes"), "DEETZ");
        assert_eq!(config.wire_name("Person", "Age"), "age");
        assert_eq!(config.convert_name("Person", "Attributes").as_deref(), Some("DEETZ"));
    }

    #[test]
    fn test_scoped_override_beats_global() {
        let config = SerializationConfig::builder()
            .rename_field("Name", "n")
            .rename_field_of("Pet", "Name", "petName")
            .build();

        assert_eq!(config.field_override("Pet", "Name"), Some("petName"));
        assert_eq!(config.field_override("Person", "Name"), Some("n"));
        assert_eq!(config.field_override("Person", "Age"), None);
    }

    #[test]
    fn test_should_omit() {
        let never = SerializationConfig::default();
        assert!(!never.should_omit(&JsonValue::Null));

        let nulls = SerializationConfig::builder()
            .ignore_condition(IgnoreCondition::WhenWritingNull)
            .build();
        assert!(nulls.should_omit(&JsonValue::Null));
        assert!(!nulls.should_omit(&json!(0)));

        let defaults = SerializationConfig::builder()
            .ignore_condition(IgnoreCondition::WhenWritingDefault)
            .build();
        assert!(defaults.should_omit(&json!(0)));
        assert!(defaults.should_omit(&json!(0.0)));
        assert!(defaults.should_omit(&json!(false)));
        assert!(!defaults.should_omit(&json!("")));
        assert!(!defaults.should_omit(&json!(42)));
    }

    #[test]
    fn test_restore_name() {
        let config = SerializationConfig::builder()
            .naming_policy(NamingPolicy::CamelCase)
            .rename_field("Attributes", "DEETZ")
            .build();
        assert_eq!(config.restore_name("radiusMm"), "radius_mm");
        assert_eq!(config.restore_name("kind"), "kind");
        assert_eq!(config.restore_name("DEETZ"), "Attributes");
        // Keys the policy cannot have written stay as they are.
        assert_eq!(config.restore_name("order_id"), "order_id");
        assert_eq!(config.restore_name("Name"), "Name");

        let kebab = SerializationConfig::builder()
            .naming_policy(NamingPolicy::KebabCaseUpper)
            .build();
        assert_eq!(kebab.restore_name("RADIUS-MM"), "radius_mm");

        assert_eq!(SerializationConfig::default().restore_name("radiusMm"), "radiusMm");
    }

    #[test]
    fn test_web_defaults() {
        let web = SerializationConfig::web();
        assert_eq!(web.naming_policy(), Some(&NamingPolicy::CamelCase));
        assert!(web.case_insensitive_names());
        assert!(web.reads_numbers_from_strings());
        assert!(!web.writes_numbers_as_strings());
    }

    #[test]
    fn test_variant_naming_requires_transform() {
        let plain = SerializationConfig::builder()
            .naming_policy(NamingPolicy::SnakeCaseLower)
            .build();
        assert_eq!(plain.variant_name("PartTime"), "PartTime");

        let named = SerializationConfig::builder()
            .naming_policy(NamingPolicy::SnakeCaseLower)
            .transform(ValueTransform::EnumVariantNaming)
            .build();
        assert_eq!(named.variant_name("PartTime"), "part_time");
    }

    #[test]
    fn test_from_json() {
        let config = SerializationConfig::from_json(
            r#"{
                "naming_policy": "camelCase",
                "ignore_condition": "WhenWritingNull",
                "field_names": [{ "field": "Attributes", "name": "DEETZ" }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.naming_policy(), Some(&NamingPolicy::CamelCase));
        assert_eq!(config.ignore_condition(), IgnoreCondition::WhenWritingNull);
        assert_eq!(config.wire_name("Person", "Attributes"), "DEETZ");
    }

    #[test]
    fn test_validate() {
        let duplicate = SerializationConfig::builder()
            .rename_field("Name", "a")
            .rename_field("Name", "b")
            .build();
        assert!(duplicate.validate().is_err());

        let empty = SerializationConfig::builder().rename_field("Name", "").build();
        assert!(empty.validate().is_err());

        let scoped = SerializationConfig::builder()
            .rename_field("Name", "a")
            .rename_field_of("Pet", "Name", "b")
            .build();
        assert!(scoped.validate().is_ok());

        assert!(SerializationConfig::from_json(r#"{ "naming_policy": "shouty" }"#).is_err());
    }
}
