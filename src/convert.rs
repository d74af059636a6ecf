//! Value converters
//!
//! A converter turns a property value into the text written to its column
//! and back. Converters are stored type-erased on property metadata; the
//! concrete Rust type is fixed when the converter is created.

use crate::codec::JsonCodec;
use crate::config::SerializationConfig;
use crate::error::Result;
use crate::naming::ConvertName;
use crate::value::{ModelRef, ModelValue, downcast_opt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub trait ValueConverter: Send + Sync + fmt::Debug {
    /// Rust type of the model-side value.
    fn model_type(&self) -> &'static str;

    fn convert_to_provider(&self, value: Option<ModelRef<'_>>) -> Result<Option<String>>;

    fn convert_from_provider(&self, text: Option<&str>) -> Result<Option<ModelValue>>;

    /// Naming rules used by query translation, if this converter has any.
    fn naming(&self) -> Option<Arc<dyn ConvertName>> {
        None
    }

    /// The serialization config behind a JSON converter.
    fn json_config(&self) -> Option<&Arc<SerializationConfig>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Converts values with [`JsonCodec`] under a shared config.
pub struct JsonValueConverter<T> {
    codec: JsonCodec,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonValueConverter<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(config: Arc<SerializationConfig>) -> Self {
        Self {
            codec: JsonCodec::new(config),
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &Arc<SerializationConfig> {
        self.codec.config()
    }

    pub fn to_provider(&self, value: Option<&T>) -> Result<Option<String>> {
        self.codec.encode(value)
    }

    pub fn from_provider(&self, text: Option<&str>) -> Result<Option<T>> {
        self.codec.decode(text)
    }
}

impl<T> ConvertName for JsonValueConverter<T> {
    fn convert_name(&self, owner: &str, field: &str) -> Option<String> {
        self.codec.config().configured_name(owner, field)
    }
}

impl<T> fmt::Debug for JsonValueConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonValueConverter")
            .field("model_type", &type_name::<T>())
            .field("config", self.codec.config())
            .finish()
    }
}

impl<T> ValueConverter for JsonValueConverter<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn model_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn convert_to_provider(&self, value: Option<ModelRef<'_>>) -> Result<Option<String>> {
        self.to_provider(downcast_opt::<T>(value)?)
    }

    fn convert_from_provider(&self, text: Option<&str>) -> Result<Option<ModelValue>> {
        Ok(self
            .from_provider(text)?
            .map(|value| Arc::new(value) as ModelValue))
    }

    fn naming(&self) -> Option<Arc<dyn ConvertName>> {
        let naming: Arc<dyn ConvertName> = self.codec.config().clone();
        Some(naming)
    }

    fn json_config(&self) -> Option<&Arc<SerializationConfig>> {
        Some(self.codec.config())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type ToProvider<T> = dyn Fn(&T) -> Result<String> + Send + Sync;
type FromProvider<T> = dyn Fn(&str) -> Result<T> + Send + Sync;

/// A user-supplied pair of conversion functions.
pub struct CustomValueConverter<T> {
    to_provider: Arc<ToProvider<T>>,
    from_provider: Arc<FromProvider<T>>,
}

impl<T: Send + Sync + 'static> CustomValueConverter<T> {
    pub fn new<F, G>(to_provider: F, from_provider: G) -> Self
    where
        F: Fn(&T) -> Result<String> + Send + Sync + 'static,
        G: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            to_provider: Arc::new(to_provider),
            from_provider: Arc::new(from_provider),
        }
    }
}

impl<T> fmt::Debug for CustomValueConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValueConverter")
            .field("model_type", &type_name::<T>())
            .finish()
    }
}

impl<T: Send + Sync + 'static> ValueConverter for CustomValueConverter<T> {
    fn model_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn convert_to_provider(&self, value: Option<ModelRef<'_>>) -> Result<Option<String>> {
        downcast_opt::<T>(value)?
            .map(|value| (self.to_provider)(value))
            .transpose()
    }

    fn convert_from_provider(&self, text: Option<&str>) -> Result<Option<ModelValue>> {
        text.map(|text| (self.from_provider)(text).map(|value| Arc::new(value) as ModelValue))
            .transpose()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
