use crate::error::{Error, Result};
use std::any::{Any, type_name};
use std::sync::Arc;

/// A property value as held by the change tracker.
///
/// Values are shared: an unchanged property keeps pointing at the same
/// allocation, which is what reference equality observes.
pub type ModelValue = Arc<dyn Any + Send + Sync>;

/// Borrowed form handed to converters and comparers.
pub type ModelRef<'a> = &'a (dyn Any + Send + Sync);

pub fn model_value<T: Any + Send + Sync>(value: T) -> ModelValue {
    Arc::new(value)
}

pub(crate) fn downcast<T: Any>(value: ModelRef<'_>) -> Result<&T> {
    value.downcast_ref::<T>().ok_or(Error::TypeMismatch {
        expected: type_name::<T>(),
    })
}

pub(crate) fn downcast_opt<T: Any>(value: Option<ModelRef<'_>>) -> Result<Option<&T>> {
    value.map(downcast::<T>).transpose()
}
