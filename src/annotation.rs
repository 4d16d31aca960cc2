//! Annotations attached to types, sites and methods.
//!
//! An annotation is any `'static` value. Its *kind* is the [`TypeKey`] of
//! its Rust type, so user-defined markers participate in qualifier guards
//! and custom scanners exactly like the built-in ones below.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TypeKey;

/// Kind of an annotation: the key of its Rust type.
pub type AnnotationKind = TypeKey;

/// A single, type-erased annotation value.
#[derive(Clone)]
pub struct Annotation {
    kind: AnnotationKind,
    value: Arc<dyn Any + Send + Sync>,
}

impl Annotation {
    /// Wraps `value` as an annotation of kind `A`.
    pub fn new<A: Any + Send + Sync>(value: A) -> Self {
        Self {
            kind: TypeKey::of::<A>(),
            value: Arc::new(value),
        }
    }

    /// The annotation's kind.
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Whether this annotation is of kind `A`.
    pub fn is<A: Any>(&self) -> bool {
        self.kind == TypeKey::of::<A>()
    }

    /// Typed view of the annotation value.
    pub fn downcast_ref<A: Any>(&self) -> Option<&A> {
        self.value.downcast_ref::<A>()
    }

    pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.value
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind.simple_name())
    }
}

/// Ordered set of annotations present on a type, site or method.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{Annotations, Inject, Named};
///
/// let annotations = Annotations::of(Inject).and(Named::new("horse"));
/// assert_eq!(annotations.len(), 2);
/// assert_eq!(annotations.get::<Named>().map(Named::value), Some("horse"));
/// assert!(annotations.get::<flavor_di::Service>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Annotations {
    items: Vec<Annotation>,
}

impl Annotations {
    /// Empty annotation set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Annotation set holding a single annotation.
    pub fn of<A: Any + Send + Sync>(value: A) -> Self {
        Self::none().and(value)
    }

    /// Appends another annotation.
    pub fn and<A: Any + Send + Sync>(mut self, value: A) -> Self {
        self.items.push(Annotation::new(value));
        self
    }

    /// Appends an already erased annotation.
    pub fn push(&mut self, annotation: Annotation) {
        self.items.push(annotation);
    }

    /// Iterates in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    /// First annotation of kind `A`, if any.
    pub fn get<A: Any>(&self) -> Option<&A> {
        self.items.iter().find_map(|a| a.downcast_ref::<A>())
    }

    /// Whether an annotation of the given kind is present.
    pub fn contains_kind(&self, kind: &AnnotationKind) -> bool {
        self.items.iter().any(|a| &a.kind == kind)
    }

    /// Whether an annotation of kind `A` is present.
    pub fn contains<A: Any>(&self) -> bool {
        self.contains_kind(&TypeKey::of::<A>())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ===== Built-in markers =====

/// Marks a field, setter or constructor for injection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inject;

/// Qualifier carrying a name; the usual target of binding guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    value: String,
}

impl Named {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Marks a type as a managed service.
///
/// A blank name makes the container fall back to the type's simple name.
/// Services with a higher priority start first; the default is
/// [`Service::DEFAULT_PRIORITY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    name: String,
    priority: i32,
}

impl Service {
    pub const DEFAULT_PRIORITY: i32 = 1;

    pub fn new() -> Self {
        Self {
            name: String::new(),
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_priority(&self) -> i32 {
        self.priority
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

/// Excludes a service from `startup()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreAutoScan;

/// Configure hook of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Configure;

/// Close hook of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Close;

/// Alternative spelling of [`Configure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostConstruct;

/// Alternative spelling of [`Close`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreDestroy;

/// Marks a binder-container producer whose result becomes a binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extract;
