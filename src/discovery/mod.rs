//! Discovery of candidate types.
//!
//! The container never enumerates types on its own. A [`DiscoveryProvider`]
//! hands it the descriptors of every type carrying a given type-level
//! marker; package scoping happens in the scheduler.

use std::sync::Arc;

use crate::annotation::AnnotationKind;
use crate::descriptors::TypeDescriptor;
use crate::key::TypeKey;

pub mod registry;

pub use registry::StaticDiscovery;

/// Source of type descriptors.
pub trait DiscoveryProvider: Send + Sync {
    /// Descriptors of all known types annotated with `marker`, in discovery
    /// order.
    fn types_with_marker(&self, marker: &AnnotationKind) -> Vec<Arc<TypeDescriptor>>;

    /// Descriptor of a specific type, if the provider knows it.
    fn descriptor_of(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>>;
}

impl<P: DiscoveryProvider + ?Sized> DiscoveryProvider for Arc<P> {
    fn types_with_marker(&self, marker: &AnnotationKind) -> Vec<Arc<TypeDescriptor>> {
        (**self).types_with_marker(marker)
    }

    fn descriptor_of(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        (**self).descriptor_of(key)
    }
}
