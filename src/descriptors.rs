//! Type descriptors: the injection sites, methods and constructors of a type.
//!
//! Rust has no runtime reflection, so every injectable type describes itself
//! once through a [`TypeDescriptor`]. The engine only ever works on
//! descriptors, never on the concrete type.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::annotation::Annotations;
use crate::args::{FromArgs, FromBindings};
use crate::error::{FlavorError, FlavorResult};
use crate::key::TypeKey;
use crate::registration::AnyArc;

type AssignFn = Arc<dyn Fn(&AnyArc, &AnyArc) -> FlavorResult<()> + Send + Sync>;
type InvokeFn = Arc<dyn Fn(&AnyArc) -> anyhow::Result<()> + Send + Sync>;
type ConstructFn = Arc<dyn Fn(ConstructorInput) -> anyhow::Result<AnyArc> + Send + Sync>;
type SingletonFn = Arc<dyn Fn() -> AnyArc + Send + Sync>;

/// A type that can describe its injection sites.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{Annotations, Inject, Injectable, Lateinit, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Greeter {
///     greeting: Lateinit<String>,
/// }
///
/// impl Injectable for Greeter {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::builder::<Greeter>()
///             .field::<String>("greeting", Annotations::of(Inject), |g, v| g.greeting.set(v))
///             .constructor::<()>(|()| Ok(Greeter::default()))
///             .build()
///     }
/// }
///
/// let descriptor = Greeter::descriptor();
/// assert_eq!(descriptor.sites().len(), 1);
/// assert_eq!(descriptor.sites()[0].name(), "greeting");
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    fn descriptor() -> TypeDescriptor;
}

/// Where an injection site lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    Field,
    Setter,
    Parameter,
}

/// A field, setter or constructor parameter that receives a bound value.
#[derive(Clone)]
pub struct InjectionSite {
    name: &'static str,
    kind: SiteKind,
    declared: TypeKey,
    annotations: Annotations,
    assign: Option<AssignFn>,
}

impl InjectionSite {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> SiteKind {
        self.kind
    }

    /// The type a binding must be declared for to satisfy this site.
    pub fn declared_type(&self) -> TypeKey {
        self.declared
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Writes `value` (an erased `Arc<V>`) into `target`.
    pub(crate) fn assign(&self, target: &AnyArc, value: &AnyArc) -> FlavorResult<()> {
        match &self.assign {
            Some(assign) => assign(target, value),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for InjectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionSite")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declared", &self.declared)
            .field("annotations", &self.annotations)
            .finish()
    }
}

/// A declared method: lifecycle hooks and targets of custom scanners.
#[derive(Clone)]
pub struct MethodSite {
    owner: TypeKey,
    name: &'static str,
    annotations: Annotations,
    invoke: InvokeFn,
}

impl MethodSite {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type declaring this method.
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Calls the method on `instance`, which must be an instance of the
    /// owning type.
    pub fn invoke(&self, instance: &AnyArc) -> anyhow::Result<()> {
        (self.invoke)(instance)
    }
}

impl fmt::Debug for MethodSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSite")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .finish()
    }
}

pub(crate) enum ConstructorInput {
    Args(Vec<Box<dyn Any + Send>>),
    Bound(Vec<AnyArc>),
}

/// How a constructor obtains its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorKind {
    /// Parameters are supplied by the caller and matched by runtime type
    Explicit,
    /// Parameters are resolved from bindings
    Injected,
}

#[derive(Clone)]
pub struct ConstructorSite {
    kind: ConstructorKind,
    params: Vec<InjectionSite>,
    construct: ConstructFn,
}

impl ConstructorSite {
    pub fn kind(&self) -> ConstructorKind {
        self.kind
    }

    pub fn params(&self) -> &[InjectionSite] {
        &self.params
    }

    pub(crate) fn signature(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.params.iter().map(|p| p.declared)
    }

    pub(crate) fn construct(&self, input: ConstructorInput) -> anyhow::Result<AnyArc> {
        (self.construct)(input)
    }
}

impl fmt::Debug for ConstructorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorSite")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish()
    }
}

enum SingletonSource {
    None,
    Instance(AnyArc),
    Lazy(OnceCell<AnyArc>, SingletonFn),
}

/// Everything the container knows about one type.
pub struct TypeDescriptor {
    key: TypeKey,
    annotations: Annotations,
    sites: Vec<InjectionSite>,
    methods: Vec<MethodSite>,
    constructors: Vec<ConstructorSite>,
    singleton: SingletonSource,
}

impl TypeDescriptor {
    /// Starts describing `T`.
    pub fn builder<T: Send + Sync + 'static>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            descriptor: TypeDescriptor {
                key: TypeKey::of::<T>(),
                annotations: Annotations::none(),
                sites: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                singleton: SingletonSource::None,
            },
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Type-level annotations (`Service`, `IgnoreAutoScan`, ...).
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Field and setter sites, in declaration order.
    pub fn sites(&self) -> &[InjectionSite] {
        &self.sites
    }

    pub fn methods(&self) -> &[MethodSite] {
        &self.methods
    }

    pub fn constructors(&self) -> &[ConstructorSite] {
        &self.constructors
    }

    /// Whether the type exposes a canonical singleton instance.
    pub fn has_singleton(&self) -> bool {
        !matches!(self.singleton, SingletonSource::None)
    }

    /// The canonical singleton instance, created on first access when lazy.
    pub fn singleton(&self) -> Option<AnyArc> {
        match &self.singleton {
            SingletonSource::None => None,
            SingletonSource::Instance(instance) => Some(instance.clone()),
            SingletonSource::Lazy(cell, make) => Some(cell.get_or_init(|| make()).clone()),
        }
    }

    /// Whether `instance` is this type's canonical singleton. A lazy
    /// singleton that was never created matches nothing.
    pub fn is_singleton_instance(&self, instance: &AnyArc) -> bool {
        let existing = match &self.singleton {
            SingletonSource::None => return false,
            SingletonSource::Instance(existing) => existing,
            SingletonSource::Lazy(cell, _) => match cell.get() {
                Some(existing) => existing,
                None => return false,
            },
        };
        std::ptr::eq(
            Arc::as_ptr(existing) as *const (),
            Arc::as_ptr(instance) as *const (),
        )
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("annotations", &self.annotations)
            .field("sites", &self.sites)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .field("singleton", &self.has_singleton())
            .finish()
    }
}

/// Typed builder for a [`TypeDescriptor`].
pub struct DescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    /// Adds a type-level annotation.
    pub fn annotated<A: Any + Send + Sync>(mut self, annotation: A) -> Self {
        self.descriptor.annotations.push(crate::Annotation::new(annotation));
        self
    }

    /// Adds a field site of declared type `V`.
    ///
    /// Only sites carrying an inject-equivalent annotation are resolved.
    pub fn field<V>(
        self,
        name: &'static str,
        annotations: Annotations,
        assign: impl Fn(&T, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.site(SiteKind::Field, name, annotations, assign)
    }

    /// Adds a setter-method site of declared type `V`.
    pub fn setter<V>(
        self,
        name: &'static str,
        annotations: Annotations,
        assign: impl Fn(&T, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.site(SiteKind::Setter, name, annotations, assign)
    }

    fn site<V, F>(mut self, kind: SiteKind, name: &'static str, annotations: Annotations, assign: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&T, Arc<V>) + Send + Sync + 'static,
    {
        let erased = move |target: &AnyArc, value: &AnyArc| -> FlavorResult<()> {
            let target = target
                .downcast_ref::<T>()
                .ok_or(FlavorError::TypeMismatch(std::any::type_name::<T>()))?;
            let value = value
                .downcast_ref::<Arc<V>>()
                .ok_or(FlavorError::TypeMismatch(std::any::type_name::<V>()))?;
            assign(target, value.clone());
            Ok(())
        };
        self.descriptor.sites.push(InjectionSite {
            name,
            kind,
            declared: TypeKey::of::<V>(),
            annotations,
            assign: Some(Arc::new(erased)),
        });
        self
    }

    /// Adds a method that lifecycle hooks and scanners can find by its
    /// annotations.
    pub fn method<F>(mut self, name: &'static str, annotations: Annotations, body: F) -> Self
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let invoke = move |instance: &AnyArc| -> anyhow::Result<()> {
            let target = instance.downcast_ref::<T>().ok_or_else(|| {
                anyhow::Error::new(FlavorError::TypeMismatch(std::any::type_name::<T>()))
            })?;
            body(target)
        };
        self.descriptor.methods.push(MethodSite {
            owner: TypeKey::of::<T>(),
            name,
            annotations,
            invoke: Arc::new(invoke),
        });
        self
    }

    /// Adds a constructor whose arguments are supplied by the caller of
    /// `injected`, matched by runtime type.
    pub fn constructor<A>(
        mut self,
        construct: impl Fn(A) -> anyhow::Result<T> + Send + Sync + 'static,
    ) -> Self
    where
        A: FromArgs + 'static,
    {
        let params = A::signature()
            .into_iter()
            .map(|declared| parameter(declared, Annotations::none()))
            .collect();
        let erased = move |input: ConstructorInput| -> anyhow::Result<AnyArc> {
            let ConstructorInput::Args(values) = input else {
                anyhow::bail!("explicit constructor called with bound values");
            };
            let args = A::from_args(values)
                .ok_or_else(|| anyhow::anyhow!("argument types do not match the constructor"))?;
            Ok(Arc::new(construct(args)?) as AnyArc)
        };
        self.descriptor.constructors.push(ConstructorSite {
            kind: ConstructorKind::Explicit,
            params,
            construct: Arc::new(erased),
        });
        self
    }

    /// Adds a constructor whose parameters are injection sites themselves.
    ///
    /// `annotations` are matched to the parameters positionally; missing
    /// entries mean "no annotations".
    pub fn inject_constructor<P>(
        mut self,
        annotations: impl IntoIterator<Item = Annotations>,
        construct: impl Fn(P) -> anyhow::Result<T> + Send + Sync + 'static,
    ) -> Self
    where
        P: FromBindings + 'static,
    {
        let mut annotations = annotations.into_iter();
        let params = P::keys()
            .into_iter()
            .map(|declared| parameter(declared, annotations.next().unwrap_or_default()))
            .collect();
        let erased = move |input: ConstructorInput| -> anyhow::Result<AnyArc> {
            let ConstructorInput::Bound(values) = input else {
                anyhow::bail!("injectable constructor called with explicit arguments");
            };
            let params = P::from_bindings(&values)
                .ok_or_else(|| anyhow::anyhow!("bound values do not match the constructor"))?;
            Ok(Arc::new(construct(params)?) as AnyArc)
        };
        self.descriptor.constructors.push(ConstructorSite {
            kind: ConstructorKind::Injected,
            params,
            construct: Arc::new(erased),
        });
        self
    }

    /// Uses `instance` as the canonical singleton.
    pub fn singleton(mut self, instance: Arc<T>) -> Self {
        self.descriptor.singleton = SingletonSource::Instance(instance as AnyArc);
        self
    }

    /// Creates the canonical singleton on first access.
    pub fn singleton_with<F>(mut self, make: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let make = move || Arc::new(make()) as AnyArc;
        self.descriptor.singleton = SingletonSource::Lazy(OnceCell::new(), Arc::new(make));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

fn parameter(declared: TypeKey, annotations: Annotations) -> InjectionSite {
    InjectionSite {
        name: declared.simple_name(),
        kind: SiteKind::Parameter,
        declared,
        annotations,
        assign: None,
    }
}
