use std::sync::Arc;

use crate::annotation::AnnotationKind;
use crate::descriptors::{Injectable, TypeDescriptor};
use crate::key::TypeKey;

use super::DiscoveryProvider;

/// In-memory discovery provider fed explicitly with [`Injectable`] types.
///
/// Registration order is discovery order. Registering the same type twice
/// replaces its descriptor in place.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{
///     DiscoveryProvider, Injectable, Service, StaticDiscovery, TypeDescriptor, key_of,
/// };
///
/// struct Cache;
///
/// impl Injectable for Cache {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::builder::<Cache>()
///             .annotated(Service::new())
///             .singleton_with(|| Cache)
///             .build()
///     }
/// }
///
/// let discovery = StaticDiscovery::new().with::<Cache>();
/// assert_eq!(discovery.types_with_marker(&key_of::<Service>()).len(), 1);
/// assert!(discovery.descriptor_of(&key_of::<Cache>()).is_some());
/// ```
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    descriptors: Vec<Arc<TypeDescriptor>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<T: Injectable>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn register<T: Injectable>(&mut self) -> &mut Self {
        self.register_descriptor(T::descriptor())
    }

    /// Registers a hand-built descriptor.
    pub fn register_descriptor(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        let descriptor = Arc::new(descriptor);
        match self.descriptors.iter_mut().find(|d| d.key() == descriptor.key()) {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl DiscoveryProvider for StaticDiscovery {
    fn types_with_marker(&self, marker: &AnnotationKind) -> Vec<Arc<TypeDescriptor>> {
        self.descriptors
            .iter()
            .filter(|d| d.annotations().contains_kind(marker))
            .cloned()
            .collect()
    }

    fn descriptor_of(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.descriptors.iter().find(|d| d.key() == *key).cloned()
    }
}
