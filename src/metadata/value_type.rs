use super::StoreType;
use crate::compare::{JsonValueComparer, ValueComparer};
use crate::config::SerializationConfig;
use crate::convert::{JsonValueConverter, ValueConverter};
use crate::error::{Error, Result};
use crate::value::{ModelRef, ModelValue, downcast};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// Converter and optional comparer produced for one JSON-bound property.
pub struct JsonBinding {
    pub converter: Arc<dyn ValueConverter>,
    pub comparer: Option<Arc<dyn ValueComparer>>,
}

/// Rust type of a property, captured when the property is declared.
///
/// The function pointers are monomorphized for that type once, so binding a
/// JSON converter or reading a value never has to look the type up again.
#[derive(Clone, Copy)]
pub struct ValueType {
    name: &'static str,
    type_id: TypeId,
    bind_json: fn(Arc<SerializationConfig>, bool) -> JsonBinding,
    write_native: fn(ModelRef<'_>, &StoreType) -> Result<String>,
    read_native: fn(&str, &StoreType) -> Result<ModelValue>,
}

impl ValueType {
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            bind_json: bind_json::<T>,
            write_native: write_native::<T>,
            read_native: read_native::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// A JSON converter for this type, plus a JSON comparer when asked for.
    pub fn bind_json(&self, config: Arc<SerializationConfig>, use_value_comparer: bool) -> JsonBinding {
        (self.bind_json)(config, use_value_comparer)
    }

    /// Storage text for a property with no converter.
    pub(crate) fn write_native(&self, value: ModelRef<'_>, store_type: &StoreType) -> Result<String> {
        (self.write_native)(value, store_type)
    }

    pub(crate) fn read_native(&self, text: &str, store_type: &StoreType) -> Result<ModelValue> {
        (self.read_native)(text, store_type)
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn bind_json<T>(config: Arc<SerializationConfig>, use_value_comparer: bool) -> JsonBinding
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let comparer = use_value_comparer
        .then(|| Arc::new(JsonValueComparer::<T>::new(config.clone())) as Arc<dyn ValueComparer>);
    JsonBinding {
        converter: Arc::new(JsonValueConverter::<T>::new(config)),
        comparer,
    }
}

// Without a converter, json columns hold the plain serde_json form and other
// columns hold scalars as bare text.
fn write_native<T>(value: ModelRef<'_>, store_type: &StoreType) -> Result<String>
where
    T: Serialize + Send + Sync + 'static,
{
    let value = downcast::<T>(value)?;
    let encode_error = |source| Error::Encode {
        target: type_name::<T>(),
        source,
    };
    if store_type.is_json() {
        return serde_json::to_string(value).map_err(encode_error);
    }
    match serde_json::to_value(value).map_err(encode_error)? {
        JsonValue::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn read_native<T>(text: &str, store_type: &StoreType) -> Result<ModelValue>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let decode_error = |source| Error::Decode {
        target: type_name::<T>(),
        text: text.to_owned(),
        source,
    };
    if store_type.is_json() {
        let value = serde_json::from_str::<T>(text).map_err(decode_error)?;
        return Ok(Arc::new(value));
    }
    // Bare text is the value itself when it reads as a string; numbers and
    // booleans parse from their JSON form.
    let value = match serde_json::from_value::<T>(JsonValue::String(text.to_owned())) {
        Ok(value) => value,
        Err(_) => serde_json::from_str::<T>(text).map_err(decode_error)?,
    };
    Ok(Arc::new(value))
}
