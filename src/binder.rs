//! Binder containers: reusable batches of bindings.
//!
//! A container is handed to [`Flavor::inherit`](crate::Flavor::inherit),
//! which runs [`BinderContainer::populate`] once and appends everything it
//! produced to the registry, in production order.

use std::sync::Arc;

use crate::annotation::Extract;
use crate::internal::contained;
use crate::key::TypeKey;
use crate::registration::{AnyArc, Binding};

/// A batch of bindings registered together.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{BinderContainer, ContainerBinder, Flavor, Named, StaticDiscovery};
/// use std::sync::Arc;
///
/// trait Animal: Send + Sync {
///     fn sound(&self) -> &'static str;
/// }
///
/// struct Horse;
/// impl Animal for Horse {
///     fn sound(&self) -> &'static str {
///         "neigh"
///     }
/// }
///
/// struct Stable;
///
/// impl BinderContainer for Stable {
///     fn populate(&self, binder: &mut ContainerBinder) {
///         binder
///             .bind(Arc::new(Horse))
///             .to_self()
///             .to::<dyn Animal>(|horse| horse)
///             .populate(|b| {
///                 b.annotated::<Named, _>(|n| n.value() == "horse");
///             })
///             .bind();
///         binder.extract("greeting", || Ok("Hey".to_string()));
///     }
/// }
///
/// let mut flavor = Flavor::create::<Stable>(StaticDiscovery::new());
/// flavor.inherit(&Stable);
/// assert_eq!(flavor.bindings().len(), 3);
/// ```
pub trait BinderContainer {
    fn populate(&self, binder: &mut ContainerBinder);
}

/// Collects the bindings produced by one [`BinderContainer`].
#[derive(Debug, Default)]
pub struct ContainerBinder {
    bindings: Vec<Binding>,
}

impl ContainerBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts binding `instance` under one or more declared types.
    pub fn bind<T: Send + Sync + 'static>(&mut self, instance: Arc<T>) -> MultiTypeBinder<'_, T> {
        MultiTypeBinder {
            binder: self,
            instance,
            targets: Vec::new(),
            populator: None,
        }
    }

    /// Like [`bind`](Self::bind) for an owned value.
    pub fn bind_value<T: Send + Sync + 'static>(&mut self, value: T) -> MultiTypeBinder<'_, T> {
        self.bind(Arc::new(value))
    }

    /// Runs an `Extract` producer once and binds its result under `T`.
    ///
    /// A failing or panicking producer is logged and yields no binding.
    /// The returned binding can be configured further (guards, scope).
    pub fn extract<T, F>(&mut self, name: &str, producer: F) -> Option<&mut Binding>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> anyhow::Result<T>,
    {
        match contained(producer) {
            Ok(value) => {
                let mut binding = Binding::new(TypeKey::of::<T>());
                binding.set_value(Arc::new(Arc::new(value)));
                self.bindings.push(binding);
                self.bindings.last_mut()
            }
            Err(message) => {
                tracing::error!(
                    target: "flavor_di",
                    producer = name,
                    marker = TypeKey::of::<Extract>().simple_name(),
                    produced = std::any::type_name::<T>(),
                    error = %message,
                    "Producer failed, no binding registered"
                );
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}

type Populator = Box<dyn Fn(&mut Binding)>;

/// One instance bound under several declared types.
///
/// Nothing is registered until [`bind`](Self::bind) is called.
#[must_use = "call .bind() to register the bindings"]
pub struct MultiTypeBinder<'a, T> {
    binder: &'a mut ContainerBinder,
    instance: Arc<T>,
    targets: Vec<(TypeKey, AnyArc)>,
    populator: Option<Populator>,
}

impl<'a, T: Send + Sync + 'static> MultiTypeBinder<'a, T> {
    /// Declares `T` itself.
    pub fn to_self(mut self) -> Self {
        let value: AnyArc = Arc::new(self.instance.clone());
        self.targets.push((TypeKey::of::<T>(), value));
        self
    }

    /// Declares `U`, usually a trait object `T` implements. `cast` performs
    /// the upcast (`|t| t` is enough for unsizing coercions).
    pub fn to<U>(mut self, cast: impl FnOnce(Arc<T>) -> Arc<U>) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        let value: AnyArc = Arc::new(cast(self.instance.clone()));
        self.targets.push((TypeKey::of::<U>(), value));
        self
    }

    /// Configurator applied to every produced binding; a later call
    /// replaces an earlier one.
    pub fn populate(mut self, populator: impl Fn(&mut Binding) + 'static) -> Self {
        self.populator = Some(Box::new(populator));
        self
    }

    /// Emits one binding per declared type, in declaration order, and
    /// returns how many were produced.
    pub fn bind(self) -> usize {
        let Self {
            binder,
            targets,
            populator,
            ..
        } = self;
        let count = targets.len();
        for (key, value) in targets {
            let mut binding = Binding::new(key);
            if let Some(populator) = &populator {
                populator(&mut binding);
            }
            binding.set_value(value);
            binder.bindings.push(binding);
        }
        count
    }
}
