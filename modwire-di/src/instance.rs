//! Pointer types for resource instances and the argument bag handed to construction methods.

use crate::error::ArgumentError;
use std::any::{type_name, Any};
use std::error::Error;
use std::sync::Arc;

/// Shared pointer to a constructed resource instance.
pub type InstancePtr<T> = Arc<T>;

/// Type-erased instance pointer. The erased value is always an [InstancePtr] of the concrete
/// resource type, which makes it possible to hold `dyn Trait` resources.
pub type InstanceAnyPtr = Arc<dyn Any + Send + Sync + 'static>;

/// Error returned by construction methods.
pub type ErrorPtr = Arc<dyn Error + Send + Sync + 'static>;

/// Erases a typed instance pointer.
#[inline]
pub fn erase<T: ?Sized + Send + Sync + 'static>(instance: InstancePtr<T>) -> InstanceAnyPtr {
    Arc::new(instance) as InstanceAnyPtr
}

/// Recovers a typed instance pointer from an erased one. Returns `None` if the erased value was
/// created for a different type.
#[inline]
pub fn downcast<T: ?Sized + Send + Sync + 'static>(
    instance: &InstanceAnyPtr,
) -> Option<InstancePtr<T>> {
    instance.downcast_ref::<InstancePtr<T>>().cloned()
}

/// Resolved dependencies of a construction method, keyed by parameter name. Each value has the
/// type declared by its parameter.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    values: Vec<(String, InstanceAnyPtr)>,
}

impl Arguments {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &str, value: InstanceAnyPtr) {
        self.values.push((name.to_string(), value));
    }

    /// Returns the argument bound to the given parameter.
    pub fn get<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<InstancePtr<T>, ArgumentError> {
        let (_, value) = self
            .values
            .iter()
            .find(|(parameter, _)| parameter == name)
            .ok_or_else(|| ArgumentError::MissingArgument(name.to_string()))?;

        downcast::<T>(value).ok_or_else(|| ArgumentError::IncompatibleArgument {
            name: name.to_string(),
            requested: type_name::<T>(),
        })
    }

    /// Returns the names of all arguments, in parameter order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
