use super::{Property, PropertyBuilder, ValueType};
use crate::error::{Error, Result};
use crate::value::ModelValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Column name -> stored text (`None` is SQL NULL).
pub type StoredRow = BTreeMap<String, Option<String>>;

/// Property name -> model value.
pub type ValueMap = BTreeMap<String, Option<ModelValue>>;

#[derive(Debug, Clone)]
pub struct EntityType {
    name: String,
    table_name: String,
    key: Option<String>,
    properties: Vec<Property>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table_name: name.clone(),
            name,
            key: None,
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Name of the key property, if one was declared.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> impl Iterator<Item = &mut Property> {
        self.properties.iter_mut()
    }

    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn property(&self, name: &str) -> Result<&Property> {
        self.find_property(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_string(), self.name.clone()))
    }

    /// Converts property values into the row written to storage. Properties
    /// missing from `values` are written as NULL.
    pub fn to_row(&self, values: &ValueMap) -> Result<StoredRow> {
        let mut row = StoredRow::new();
        for property in &self.properties {
            let value = values.get(property.name()).and_then(|v| v.as_deref());
            row.insert(
                property.column_name().to_string(),
                property.write_value(value)?,
            );
        }
        Ok(row)
    }

    /// Reads property values back from a stored row. Decode failures
    /// propagate; a missing column reads as NULL.
    pub fn from_row(&self, row: &StoredRow) -> Result<ValueMap> {
        let mut values = ValueMap::new();
        for property in &self.properties {
            let text = row.get(property.column_name()).and_then(|t| t.as_deref());
            values.insert(property.name().to_string(), property.read_value(text)?);
        }
        Ok(values)
    }
}

pub struct EntityTypeBuilder<'a> {
    entity: &'a mut EntityType,
}

impl<'a> EntityTypeBuilder<'a> {
    pub(crate) fn new(entity: &'a mut EntityType) -> Self {
        Self { entity }
    }

    pub fn to_table(&mut self, name: impl Into<String>) -> &mut Self {
        self.entity.table_name = name.into();
        self
    }

    pub fn has_key(&mut self, property: impl Into<String>) -> &mut Self {
        self.entity.key = Some(property.into());
        self
    }

    /// Declares (or returns the already declared) property `name` of type `T`.
    pub fn property<T>(&mut self, name: &str) -> PropertyBuilder<'_>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let properties = &mut self.entity.properties;
        let index = match properties.iter().position(|p| p.name() == name) {
            Some(index) => index,
            None => {
                properties.push(Property::new(name, ValueType::of::<T>()));
                properties.len() - 1
            }
        };
        PropertyBuilder::new(&mut properties[index])
    }

    pub fn metadata(&self) -> &EntityType {
        self.entity
    }
}
