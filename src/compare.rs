//! Value comparers used by change tracking.
//!
//! [`JsonValueComparer`] judges two values equal when their canonical JSON
//! encodings are equal, so a collection replaced by an equal copy is not
//! reported as modified. [`ReferenceComparer`] is what a property without a
//! comparer gets: only the very same allocation counts as unchanged.

use crate::codec::JsonCodec;
use crate::config::SerializationConfig;
use crate::error::Result;
use crate::value::{ModelRef, downcast_opt};
use serde::Serialize;
use std::any::{Any, type_name};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Hash reported for an absent value.
pub const NULL_HASH: u64 = 0;

pub trait ValueComparer: Send + Sync + fmt::Debug {
    fn values_equal(&self, left: Option<ModelRef<'_>>, right: Option<ModelRef<'_>>)
    -> Result<bool>;

    /// Must agree with `values_equal`: equal values hash equally.
    fn value_hash(&self, value: Option<ModelRef<'_>>) -> Result<u64>;

    fn json_config(&self) -> Option<&Arc<SerializationConfig>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

pub struct JsonValueComparer<T> {
    codec: JsonCodec,
    _marker: PhantomData<fn(&T)>,
}

impl<T> JsonValueComparer<T>
where
    T: Serialize + Send + Sync + 'static,
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

    pub fn equals(&self, left: Option<&T>, right: Option<&T>) -> Result<bool> {
        match (left, right) {
            (None, None) => Ok(true),
            (Some(left), Some(right)) => {
                Ok(self.codec.encode_value(left)? == self.codec.encode_value(right)?)
            }
            _ => Ok(false),
        }
    }

    pub fn hash(&self, value: Option<&T>) -> Result<u64> {
        match value {
            None => Ok(NULL_HASH),
            Some(value) => {
                let text = self.codec.encode_value(value)?;
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                Ok(hasher.finish())
            }
        }
    }
}

impl<T> fmt::Debug for JsonValueComparer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonValueComparer")
            .field("model_type", &type_name::<T>())
            .field("config", self.codec.config())
            .finish()
    }
}

impl<T> ValueComparer for JsonValueComparer<T>
where
    T: Serialize + Send + Sync + 'static,
{
    fn values_equal(
        &self,
        left: Option<ModelRef<'_>>,
        right: Option<ModelRef<'_>>,
    ) -> Result<bool> {
        self.equals(downcast_opt::<T>(left)?, downcast_opt::<T>(right)?)
    }

    fn value_hash(&self, value: Option<ModelRef<'_>>) -> Result<u64> {
        self.hash(downcast_opt::<T>(value)?)
    }

    fn json_config(&self) -> Option<&Arc<SerializationConfig>> {
        Some(self.codec.config())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Pointer identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceComparer;

fn address(value: ModelRef<'_>) -> *const () {
    value as *const (dyn Any + Send + Sync) as *const ()
}

impl ValueComparer for ReferenceComparer {
    fn values_equal(
        &self,
        left: Option<ModelRef<'_>>,
        right: Option<ModelRef<'_>>,
    ) -> Result<bool> {
        Ok(match (left, right) {
            (None, None) => true,
            (Some(left), Some(right)) => std::ptr::eq(address(left), address(right)),
            _ => false,
        })
    }

    fn value_hash(&self, value: Option<ModelRef<'_>>) -> Result<u64> {
        Ok(value.map_or(NULL_HASH, |value| address(value) as usize as u64))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type EqualsFn<T> = dyn Fn(&T, &T) -> bool + Send + Sync;
type HashFn<T> = dyn Fn(&T) -> u64 + Send + Sync;

/// Comparer built from user closures. Absent values are handled here; the
/// closures only ever see present ones.
pub struct CustomValueComparer<T> {
    equals: Arc<EqualsFn<T>>,
    hash: Arc<HashFn<T>>,
}

impl<T: Send + Sync + 'static> CustomValueComparer<T> {
    pub fn new<E, H>(equals: E, hash: H) -> Self
    where
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
        H: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self {
            equals: Arc::new(equals),
            hash: Arc::new(hash),
        }
    }
}

impl<T> fmt::Debug for CustomValueComparer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValueComparer")
            .field("model_type", &type_name::<T>())
            .finish()
    }
}

impl<T: Send + Sync + 'static> ValueComparer for CustomValueComparer<T> {
    fn values_equal(
        &self,
        left: Option<ModelRef<'_>>,
        right: Option<ModelRef<'_>>,
    ) -> Result<bool> {
        Ok(match (downcast_opt::<T>(left)?, downcast_opt::<T>(right)?) {
            (None, None) => true,
            (Some(left), Some(right)) => (self.equals)(left, right),
            _ => false,
        })
    }

    fn value_hash(&self, value: Option<ModelRef<'_>>) -> Result<u64> {
        Ok(downcast_opt::<T>(value)?.map_or(NULL_HASH, |value| (self.hash)(value)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
