//! Change tracking
//!
//! An [`EntityEntry`] keeps the values an entity had when it was loaded (or
//! last saved) next to its current values. [`ChangeDetector`] compares the
//! two with each property's comparer; a property without one falls back to
//! [`ReferenceComparer`].

use crate::compare::{ReferenceComparer, ValueComparer};
use crate::error::Result;
use crate::metadata::{EntityType, ValueMap};
use crate::value::{ModelRef, ModelValue, downcast_opt};
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Unchanged,
    Modified,
}

#[derive(Debug, Clone)]
pub struct EntityEntry {
    entity_type: String,
    state: EntityState,
    original: ValueMap,
    current: ValueMap,
}

impl EntityEntry {
    /// A new entity that has never been saved.
    pub fn added(entity_type: impl Into<String>, values: ValueMap) -> Self {
        Self {
            entity_type: entity_type.into(),
            state: EntityState::Added,
            original: ValueMap::new(),
            current: values,
        }
    }

    /// An entity read from storage. Original and current values share the
    /// same allocations until a value is replaced.
    pub fn loaded(entity_type: impl Into<String>, values: ValueMap) -> Self {
        Self {
            entity_type: entity_type.into(),
            state: EntityState::Unchanged,
            original: values.clone(),
            current: values,
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn current_values(&self) -> &ValueMap {
        &self.current
    }

    pub fn current_value(&self, property: &str) -> Option<ModelRef<'_>> {
        self.current.get(property).and_then(|v| v.as_deref())
    }

    pub fn original_value(&self, property: &str) -> Option<ModelRef<'_>> {
        self.original.get(property).and_then(|v| v.as_deref())
    }

    /// Typed view of a current value.
    pub fn get<T: Any>(&self, property: &str) -> Result<Option<&T>> {
        downcast_opt::<T>(self.current_value(property))
    }

    /// Replaces a current value with a new allocation.
    pub fn set<T: Any + Send + Sync>(&mut self, property: &str, value: Option<T>) {
        self.set_value(property, value.map(|v| Arc::new(v) as ModelValue));
    }

    pub fn set_value(&mut self, property: &str, value: Option<ModelValue>) {
        self.current.insert(property.to_string(), value);
    }

    /// Marks the current values as saved.
    pub fn accept_changes(&mut self) {
        self.original = self.current.clone();
        self.state = EntityState::Unchanged;
    }

    pub(crate) fn mark_modified(&mut self) {
        if self.state == EntityState::Unchanged {
            self.state = EntityState::Modified;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Names of the properties whose current value differs from the
    /// original. Comparer errors propagate.
    pub fn detect_changes(&self, entity_type: &EntityType, entry: &mut EntityEntry) -> Result<Vec<String>> {
        if entry.state == EntityState::Added {
            return Ok(entity_type.properties().iter().map(|p| p.name().to_string()).collect());
        }

        let mut changed = Vec::new();
        for property in entity_type.properties() {
            let comparer: &dyn ValueComparer = match property.comparer() {
                Some(comparer) => comparer.as_ref(),
                None => &ReferenceComparer,
            };
            let original = entry.original_value(property.name());
            let current = entry.current_value(property.name());
            if !comparer.values_equal(original, current)? {
                trace!("Property '{}.{}' changed", entity_type.name(), property.name());
                changed.push(property.name().to_string());
            }
        }

        if !changed.is_empty() {
            entry.mark_modified();
        }
        Ok(changed)
    }
}
