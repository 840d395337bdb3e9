//! Type-level strategies registered by the caller.

use std::any::TypeId;
use std::collections::HashMap;

use crate::arbitrary::{Arbitrary, ErasedArbitrary};

/// Type-safe registry of arbitraries keyed by the type they produce
///
/// Filled while building a `Fixtura` instance and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    arbitraries: HashMap<TypeId, ErasedArbitrary>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the strategy for a type, replacing any earlier one
    pub fn register<T: 'static>(&mut self, arbitrary: Arbitrary<T>) {
        self.arbitraries
            .insert(TypeId::of::<T>(), ErasedArbitrary::new(arbitrary));
    }

    /// Get the strategy for a type
    pub fn get<T: 'static>(&self) -> Option<&Arbitrary<T>> {
        self.arbitraries
            .get(&TypeId::of::<T>())
            .and_then(|erased| erased.downcast::<T>())
    }

    /// Check if a strategy is registered for a type
    pub fn contains<T: 'static>(&self) -> bool {
        self.arbitraries.contains_key(&TypeId::of::<T>())
    }

    /// Remove the strategy for a type
    pub fn remove<T: 'static>(&mut self) -> bool {
        self.arbitraries.remove(&TypeId::of::<T>()).is_some()
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.arbitraries.len()
    }

    /// Whether no strategy is registered
    pub fn is_empty(&self) -> bool {
        self.arbitraries.is_empty()
    }
}
