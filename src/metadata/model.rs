use super::{EntityType, EntityTypeBuilder};
use crate::convention::ConventionSet;
use crate::error::{Error, Result};
use tracing::debug;

/// A finalized, read-only model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    entity_types: Vec<EntityType>,
}

impl Model {
    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    pub fn find_entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_types.iter().find(|e| e.name() == name)
    }

    pub fn entity_type(&self, name: &str) -> Result<&EntityType> {
        self.find_entity_type(name)
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct ModelBuilder {
    entity_types: Vec<EntityType>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares entity type `name` (once) and configures it.
    pub fn entity<F>(&mut self, name: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut EntityTypeBuilder<'_>),
    {
        let index = match self.entity_types.iter().position(|e| e.name() == name) {
            Some(index) => index,
            None => {
                self.entity_types.push(EntityType::new(name));
                self.entity_types.len() - 1
            }
        };
        configure(&mut EntityTypeBuilder::new(&mut self.entity_types[index]));
        self
    }

    pub fn entity_types(&self) -> &[EntityType] {
        &self.entity_types
    }

    pub fn entity_types_mut(&mut self) -> impl Iterator<Item = &mut EntityType> {
        self.entity_types.iter_mut()
    }

    /// Runs the model-finalizing conventions and checks the result.
    pub fn finalize(mut self, conventions: &ConventionSet) -> Result<Model> {
        conventions.run_model_finalizing(&mut self)?;

        for entity in &self.entity_types {
            if let Some(key) = entity.key() {
                entity.property(key)?;
            }
            for property in entity.properties() {
                if let Some(converter) = property.converter() {
                    if converter.model_type() != property.value_type().name() {
                        return Err(Error::InvalidConfig(format!(
                            "Converter for '{}.{}' handles {}, but the property is {}",
                            entity.name(),
                            property.name(),
                            converter.model_type(),
                            property.value_type().name()
                        )));
                    }
                }
            }
        }

        debug!("Model finalized with {} entity types", self.entity_types.len());
        Ok(Model {
            entity_types: self.entity_types,
        })
    }
}
