use super::{ConfigurationSource, StoreType, ValueType};
use crate::compare::ValueComparer;
use crate::config::SerializationConfig;
use crate::convert::ValueConverter;
use crate::error::Result;
use crate::naming::ConvertName;
use crate::value::{ModelRef, ModelValue};
use std::sync::Arc;
use tracing::debug;

/// A mapped property and the converter/comparer chosen for it.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    column_name: String,
    value_type: ValueType,
    store_type: StoreType,
    converter: Option<Arc<dyn ValueConverter>>,
    converter_source: Option<ConfigurationSource>,
    comparer: Option<Arc<dyn ValueComparer>>,
    comparer_source: Option<ConfigurationSource>,
}

/// How a finalized property reads and writes JSON through the codec.
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    pub column: String,
    pub value_type: &'static str,
    pub config: Arc<SerializationConfig>,
    pub uses_value_comparer: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            value_type,
            store_type: StoreType::Other("text".to_string()),
            converter: None,
            converter_source: None,
            comparer: None,
            comparer_source: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn store_type(&self) -> &StoreType {
        &self.store_type
    }

    pub fn converter(&self) -> Option<&Arc<dyn ValueConverter>> {
        self.converter.as_ref()
    }

    pub fn converter_source(&self) -> Option<ConfigurationSource> {
        self.converter_source
    }

    pub fn comparer(&self) -> Option<&Arc<dyn ValueComparer>> {
        self.comparer.as_ref()
    }

    pub fn comparer_source(&self) -> Option<ConfigurationSource> {
        self.comparer_source
    }

    /// Whether configuration from `source` may replace the current converter.
    pub fn can_set_converter(&self, source: ConfigurationSource) -> bool {
        self.converter_source.is_none_or(|existing| source >= existing)
    }

    pub fn can_set_comparer(&self, source: ConfigurationSource) -> bool {
        self.comparer_source.is_none_or(|existing| source >= existing)
    }

    /// Sets the converter if `source` is strong enough. `None` records an
    /// explicit absence that weaker sources cannot fill in.
    pub fn set_converter(
        &mut self,
        converter: Option<Arc<dyn ValueConverter>>,
        source: ConfigurationSource,
    ) -> bool {
        if !self.can_set_converter(source) {
            return false;
        }
        self.converter = converter;
        self.converter_source = Some(source);
        true
    }

    pub fn set_comparer(
        &mut self,
        comparer: Option<Arc<dyn ValueComparer>>,
        source: ConfigurationSource,
    ) -> bool {
        if !self.can_set_comparer(source) {
            return false;
        }
        self.comparer = comparer;
        self.comparer_source = Some(source);
        true
    }

    /// Naming rules of the converter, consulted by query translation.
    pub fn naming(&self) -> Option<Arc<dyn ConvertName>> {
        self.converter.as_ref().and_then(|converter| converter.naming())
    }

    /// `Some` when the property is read and written through the JSON codec.
    pub fn binding(&self) -> Option<ColumnBinding> {
        let config = self.converter.as_ref()?.json_config()?;
        Some(ColumnBinding {
            column: self.column_name.clone(),
            value_type: self.value_type.name(),
            config: config.clone(),
            uses_value_comparer: self
                .comparer
                .as_ref()
                .is_some_and(|comparer| comparer.json_config().is_some()),
        })
    }

    /// Text stored for `value`.
    pub fn write_value(&self, value: Option<ModelRef<'_>>) -> Result<Option<String>> {
        match &self.converter {
            Some(converter) => converter.convert_to_provider(value),
            None => value
                .map(|value| self.value_type.write_native(value, &self.store_type))
                .transpose(),
        }
    }

    /// Value read back from stored text.
    pub fn read_value(&self, text: Option<&str>) -> Result<Option<ModelValue>> {
        match &self.converter {
            Some(converter) => converter.convert_from_provider(text),
            None => text
                .map(|text| self.value_type.read_native(text, &self.store_type))
                .transpose(),
        }
    }
}

/// Configures one property. Everything set here is [`ConfigurationSource::Explicit`].
pub struct PropertyBuilder<'a> {
    property: &'a mut Property,
}

impl<'a> PropertyBuilder<'a> {
    pub(crate) fn new(property: &'a mut Property) -> Self {
        Self { property }
    }

    pub fn has_column_name(self, name: impl Into<String>) -> Self {
        self.property.column_name = name.into();
        self
    }

    /// Storage type tag, e.g. `jsonb`.
    pub fn has_column_type(self, tag: &str) -> Self {
        self.property.store_type = StoreType::parse(tag);
        self
    }

    pub fn has_conversion(self, converter: impl ValueConverter + 'static) -> Self {
        let converter: Arc<dyn ValueConverter> = Arc::new(converter);
        self.property
            .set_converter(Some(converter), ConfigurationSource::Explicit);
        self
    }

    pub fn has_value_comparer(self, comparer: impl ValueComparer + 'static) -> Self {
        let comparer: Arc<dyn ValueComparer> = Arc::new(comparer);
        self.property
            .set_comparer(Some(comparer), ConfigurationSource::Explicit);
        self
    }

    /// Read and write this property through the JSON codec with `config`.
    ///
    /// `None` opts the property out of any model-wide default config.
    pub fn use_json_serializer_config(
        self,
        config: Option<Arc<SerializationConfig>>,
        use_value_comparer: bool,
    ) -> Self {
        let (converter, comparer) = match config {
            Some(config) => {
                let binding = self.property.value_type.bind_json(config, use_value_comparer);
                (Some(binding.converter), binding.comparer)
            }
            None => (None, None),
        };

        debug!(
            "Explicit JSON configuration for property '{}' (value comparer: {})",
            self.property.name,
            comparer.is_some()
        );

        self.property
            .set_converter(converter, ConfigurationSource::Explicit);
        self.property
            .set_comparer(comparer, ConfigurationSource::Explicit);
        self
    }

    pub fn metadata(&self) -> &Property {
        self.property
    }
}
