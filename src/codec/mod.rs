//! JSON Codec
//!
//! Converts typed values to and from the JSON text stored in a structured
//! column. Field names follow the [`SerializationConfig`]: per-field
//! override, then naming policy, then the declared identifier.
//!
//! # Architecture
//!
//! - `ser.rs` - serde `Serializer` building a `serde_json::Value`
//! - `de.rs` - serde `Deserializer` reading a `serde_json::Value` back
//!
//! `None` never reaches serde: an absent value is stored as SQL NULL, not as
//! the JSON literal `null`.

mod de;
mod ser;

use crate::config::SerializationConfig;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::any::type_name;
use std::sync::Arc;

/// Encodes and decodes values with one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    config: Arc<SerializationConfig>,
}

impl JsonCodec {
    pub fn new(config: Arc<SerializationConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Arc<SerializationConfig> {
        &self.config
    }

    /// Encode an optional value; `None` stays `None`.
    pub fn encode<T: Serialize + ?Sized>(&self, value: Option<&T>) -> Result<Option<String>> {
        value.map(|v| self.encode_value(v)).transpose()
    }

    /// Decode optional stored text; `None` stays `None`.
    pub fn decode<T: DeserializeOwned>(&self, text: Option<&str>) -> Result<Option<T>> {
        text.map(|t| self.decode_value(t)).transpose()
    }

    /// The canonical JSON text for `value`.
    pub fn encode_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let document = self.to_document(value)?;
        let text = if self.config.write_indented() {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        text.map_err(|source| Error::Encode {
            target: type_name::<T>(),
            source,
        })
    }

    pub fn decode_value<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        let decode_error = |source| Error::Decode {
            target: type_name::<T>(),
            text: text.to_owned(),
            source,
        };
        let document: JsonValue = serde_json::from_str(text).map_err(decode_error)?;
        T::deserialize(de::WireDeserializer::new(document, &self.config)).map_err(decode_error)
    }

    /// The document tree that `encode_value` writes.
    pub fn to_document<T: Serialize + ?Sized>(&self, value: &T) -> Result<JsonValue> {
        value
            .serialize(ser::WireSerializer::new(&self.config))
            .map_err(|source| Error::Encode {
                target: type_name::<T>(),
                source,
            })
    }
}
