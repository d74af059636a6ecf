//! Model-finalizing conventions
//!
//! Conventions run once, when a [`ModelBuilder`] is finalized, and configure
//! properties the user left alone. They set everything at
//! [`ConfigurationSource::Convention`], so explicit configuration always wins.

use crate::config::SerializationConfig;
use crate::error::Result;
use crate::metadata::{ConfigurationSource, ModelBuilder};
use std::sync::Arc;
use tracing::debug;

pub trait ModelFinalizingConvention: Send + Sync {
    fn name(&self) -> &'static str;

    fn process_model_finalizing(&self, model: &mut ModelBuilder) -> Result<()>;
}

/// Conventions applied in registration order.
#[derive(Default)]
pub struct ConventionSet {
    model_finalizing: Vec<Box<dyn ModelFinalizingConvention>>,
}

impl ConventionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, convention: Box<dyn ModelFinalizingConvention>) {
        debug!("Registered model finalizing convention: {}", convention.name());
        self.model_finalizing.push(convention);
    }

    pub fn len(&self) -> usize {
        self.model_finalizing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model_finalizing.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.model_finalizing.iter().map(|c| c.name()).collect()
    }

    pub fn run_model_finalizing(&self, model: &mut ModelBuilder) -> Result<()> {
        for convention in &self.model_finalizing {
            convention.process_model_finalizing(model)?;
        }
        Ok(())
    }
}

/// Binds every `json`/`jsonb` property to the default serialization config.
///
/// A comparer is only attached when the converter could be attached too; a
/// property whose converter was configured explicitly keeps its comparer
/// untouched.
#[derive(Debug, Clone)]
pub struct JsonSerializerConfigConvention {
    default_config: Option<Arc<SerializationConfig>>,
    use_value_comparer: bool,
}

impl JsonSerializerConfigConvention {
    pub fn new(default_config: Option<Arc<SerializationConfig>>, use_value_comparer: bool) -> Self {
        Self {
            default_config,
            use_value_comparer,
        }
    }
}

impl ModelFinalizingConvention for JsonSerializerConfigConvention {
    fn name(&self) -> &'static str {
        "JsonSerializerConfig"
    }

    fn process_model_finalizing(&self, model: &mut ModelBuilder) -> Result<()> {
        let Some(config) = &self.default_config else {
            return Ok(());
        };

        for entity in model.entity_types_mut() {
            let entity_name = entity.name().to_string();
            for property in entity.properties_mut() {
                if !property.store_type().is_json() {
                    continue;
                }

                let can_set_converter = property.can_set_converter(ConfigurationSource::Convention);
                if !can_set_converter {
                    debug!(
                        "Keeping configured converter for '{}.{}'",
                        entity_name,
                        property.name()
                    );
                    continue;
                }

                let binding = property
                    .value_type()
                    .bind_json(config.clone(), self.use_value_comparer);
                property.set_converter(Some(binding.converter), ConfigurationSource::Convention);

                if property.can_set_comparer(ConfigurationSource::Convention) {
                    property.set_comparer(binding.comparer, ConfigurationSource::Convention);
                }

                debug!(
                    "Bound '{}.{}' to the default JSON config (value comparer: {})",
                    entity_name,
                    property.name(),
                    property.binding().is_some_and(|b| b.uses_value_comparer)
                );
            }
        }
        Ok(())
    }
}
