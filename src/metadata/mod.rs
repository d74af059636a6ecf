//! Model metadata
//!
//! Entity types and their properties, as declared through [`ModelBuilder`]
//! and rewritten by model-finalizing conventions.

mod entity;
mod model;
mod property;
mod value_type;

pub use entity::{EntityType, EntityTypeBuilder, StoredRow, ValueMap};
pub use model::{Model, ModelBuilder};
pub use property::{ColumnBinding, Property, PropertyBuilder};
pub use value_type::{JsonBinding, ValueType};

use std::fmt;

/// Where a piece of property configuration came from. Later variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigurationSource {
    Convention,
    DataAnnotation,
    Explicit,
}

/// Storage column type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreType {
    Json,
    Jsonb,
    Other(String),
}

impl StoreType {
    pub fn parse(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("json") {
            StoreType::Json
        } else if tag.eq_ignore_ascii_case("jsonb") {
            StoreType::Jsonb
        } else {
            StoreType::Other(tag.to_string())
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, StoreType::Json | StoreType::Jsonb)
    }

    pub fn as_str(&self) -> &str {
        match self {
            StoreType::Json => "json",
            StoreType::Jsonb => "jsonb",
            StoreType::Other(tag) => tag,
        }
    }
}

impl From<&str> for StoreType {
    fn from(tag: &str) -> Self {
        StoreType::parse(tag)
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
