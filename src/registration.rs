//! Bindings and the binding registry.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::annotation::AnnotationKind;
use crate::key::TypeKey;
use crate::scope::Scope;

/// Type-erased shared value.
///
/// Injected instances are stored as `Arc<T>` coerced to this type. Bound
/// values are stored as an `Arc<V>` wrapped once more, so unsized declared
/// types (`dyn Trait`) go through the same path as concrete ones.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Qualifier predicate over one annotation kind.
pub(crate) type Guard = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> bool + Send + Sync>;

/// A registered association from a declared type to a concrete instance.
#[derive(Clone)]
pub struct Binding {
    key: TypeKey,
    scope: Scope,
    value: Option<AnyArc>,
    guards: Vec<(AnnotationKind, Guard)>,
}

impl Binding {
    pub(crate) fn new(key: TypeKey) -> Self {
        Self {
            key,
            scope: Scope::NoScope,
            value: None,
            guards: Vec::new(),
        }
    }

    /// Declared type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether a value was attached; unbound bindings never resolve.
    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }

    /// Annotation kinds guarded by this binding, in registration order.
    pub fn guard_kinds(&self) -> impl Iterator<Item = AnnotationKind> + '_ {
        self.guards.iter().map(|(kind, _)| *kind)
    }

    pub fn scoped(&mut self, scope: Scope) -> &mut Self {
        self.scope = scope;
        self
    }

    /// Attaches a guard evaluated against annotations of kind `A` on the
    /// injection site. A second guard for the same kind replaces the first.
    pub fn annotated<A, F>(&mut self, predicate: F) -> &mut Self
    where
        A: Any,
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let kind = TypeKey::of::<A>();
        let guard: Guard = Arc::new(move |annotation: &(dyn Any + Send + Sync)| {
            annotation.downcast_ref::<A>().map(&predicate).unwrap_or(false)
        });
        match self.guards.iter_mut().find(|(k, _)| *k == kind) {
            Some(existing) => existing.1 = guard,
            None => self.guards.push((kind, guard)),
        }
        self
    }

    pub(crate) fn guard_for(&self, kind: &AnnotationKind) -> Option<&Guard> {
        self.guards.iter().find(|(k, _)| k == kind).map(|(_, g)| g)
    }

    pub(crate) fn value(&self) -> Option<&AnyArc> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: AnyArc) {
        self.value = Some(value);
    }

    pub(crate) fn describe(&self) -> BindingDescriptor {
        BindingDescriptor {
            type_name: self.key.display_name(),
            scope: self.scope,
            guard_kinds: self.guard_kinds().map(|k| k.display_name()).collect(),
            bound: self.is_bound(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("bound", &self.is_bound())
            .field("guards", &self.guard_kinds().collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent builder returned by [`Flavor::bind`](crate::Flavor::bind).
///
/// The binding is already part of the registry; it starts participating in
/// resolution once [`to`](Self::to) or [`to_arc`](Self::to_arc) is called.
pub struct BindingBuilder<'a, T: ?Sized> {
    binding: &'a mut Binding,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<'a, T: ?Sized + Send + Sync + 'static> BindingBuilder<'a, T> {
    pub(crate) fn new(binding: &'a mut Binding) -> Self {
        Self {
            binding,
            _marker: PhantomData,
        }
    }

    pub fn scoped(self, scope: Scope) -> Self {
        self.binding.scoped(scope);
        self
    }

    /// Guard on annotations of kind `A`; see [`Binding::annotated`].
    pub fn annotated<A: Any>(self, predicate: impl Fn(&A) -> bool + Send + Sync + 'static) -> Self {
        self.binding.annotated::<A, _>(predicate);
        self
    }

    /// Binds an already shared instance.
    pub fn to_arc(self, instance: Arc<T>) -> Self {
        self.binding.set_value(Arc::new(instance));
        self
    }
}

impl<'a, T: Send + Sync + 'static> BindingBuilder<'a, T> {
    /// Binds `value`.
    pub fn to(self, value: T) -> Self {
        self.to_arc(Arc::new(value))
    }
}

/// Read-only view of a binding, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    pub type_name: &'static str,
    pub scope: Scope,
    pub guard_kinds: Vec<&'static str>,
    pub bound: bool,
}

/// Append-only, ordered collection of bindings.
#[derive(Default)]
pub(crate) struct BindingRegistry {
    bindings: Vec<Binding>,
}

impl BindingRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a fresh binding for `key` and hands it back for configuration.
    pub(crate) fn push(&mut self, key: TypeKey) -> &mut Binding {
        self.bindings.push(Binding::new(key));
        let last = self.bindings.len() - 1;
        &mut self.bindings[last]
    }

    pub(crate) fn extend(&mut self, bindings: impl IntoIterator<Item = Binding>) {
        self.bindings.extend(bindings);
    }

    /// Bound bindings declared for `key`, in registration order.
    pub(crate) fn candidates<'a>(&'a self, key: &'a TypeKey) -> impl Iterator<Item = &'a Binding> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.key == *key && b.is_bound())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Named;

    #[test]
    fn test_push_preserves_order() {
        let mut registry = BindingRegistry::new();
        registry.push(TypeKey::of::<String>()).set_value(Arc::new(Arc::new("a".to_string())));
        registry.push(TypeKey::of::<u8>()).set_value(Arc::new(Arc::new(1u8)));
        registry.push(TypeKey::of::<String>()).set_value(Arc::new(Arc::new("b".to_string())));
        registry.push(TypeKey::of::<String>());

        let key = TypeKey::of::<String>();
        let values: Vec<String> = registry
            .candidates(&key)
            .map(|b| b.value().unwrap().downcast_ref::<Arc<String>>().unwrap().to_string())
            .collect();
        // unbound binding is skipped
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_guard_replacement() {
        let mut binding = Binding::new(TypeKey::of::<String>());
        binding.annotated::<Named, _>(|n| n.value() == "a");
        binding.annotated::<Named, _>(|n| n.value() == "b");
        assert_eq!(binding.guard_kinds().count(), 1);

        let guard = binding.guard_for(&TypeKey::of::<Named>()).unwrap();
        assert!(guard(&Named::new("b")));
        assert!(!guard(&Named::new("a")));
        // wrong annotation type never passes
        assert!(!guard(&5u8));
    }

    #[test]
    fn test_describe() {
        let mut binding = Binding::new(TypeKey::of::<u32>());
        binding.scoped(Scope::Singleton).annotated::<Named, _>(|_| true);
        let d = binding.describe();
        assert_eq!(d.type_name, "u32");
        assert_eq!(d.scope, Scope::Singleton);
        assert!(!d.bound);
        assert_eq!(d.guard_kinds.len(), 1);
    }
}
