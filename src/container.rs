//! The `Flavor` container.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::args::Args;
use crate::binder::{BinderContainer, ContainerBinder};
use crate::descriptors::{Injectable, MethodSite, TypeDescriptor};
use crate::discovery::DiscoveryProvider;
use crate::engine::{InjectionEngine, ScannerHandler, ScannerTable};
use crate::error::{FlavorError, FlavorResult};
use crate::key::TypeKey;
use crate::mappings::AnnotationMappings;
use crate::observer::{LifecycleObserver, Observers, TracingObserver};
use crate::options::FlavorOptions;
use crate::registration::{AnyArc, BindingBuilder, BindingDescriptor, BindingRegistry};
use crate::resolver::InjectionContext;
use crate::scheduler::{LifecycleScheduler, ServiceTable};

/// Runtime dependency-injection container.
///
/// A container is created for an *initializer* type whose module path is
/// the default scan package. Bindings are registered with
/// [`bind`](Self::bind) or [`inherit`](Self::inherit), services are
/// discovered and configured by [`startup`](Self::startup) and torn down by
/// [`close`](Self::close). Nothing happens implicitly on drop.
pub struct Flavor {
    initializer: TypeKey,
    options: FlavorOptions,
    discovery: Arc<dyn DiscoveryProvider>,
    registry: BindingRegistry,
    services: ServiceTable,
    scanners: ScannerTable,
    mappings: AnnotationMappings,
    observers: Observers,
}

impl Flavor {
    /// Creates a container with default options.
    pub fn create<I: ?Sized + 'static>(discovery: impl DiscoveryProvider + 'static) -> Self {
        Self::with_options::<I>(discovery, FlavorOptions::default())
    }

    pub fn with_options<I: ?Sized + 'static>(
        discovery: impl DiscoveryProvider + 'static,
        options: FlavorOptions,
    ) -> Self {
        let mut observers = Observers::new();
        if options.log_lifecycle {
            observers.add(Arc::new(TracingObserver::new()));
        }
        let initializer = TypeKey::of::<I>();
        tracing::debug!(
            target: "flavor_di",
            initializer = initializer.display_name(),
            options = %options,
            "Creating container"
        );
        Self {
            initializer,
            options,
            discovery: Arc::new(discovery),
            registry: BindingRegistry::new(),
            services: ServiceTable::new(),
            scanners: ScannerTable::new(),
            mappings: AnnotationMappings::default(),
            observers,
        }
    }

    /// Scan package: the configured one, else the initializer's module path.
    pub fn package(&self) -> &str {
        self.options
            .package
            .as_deref()
            .unwrap_or_else(|| self.initializer.package())
    }

    pub fn options(&self) -> &FlavorOptions {
        &self.options
    }

    pub fn mappings(&self) -> &AnnotationMappings {
        &self.mappings
    }

    /// Extends the annotation equivalence table.
    pub fn mappings_mut(&mut self) -> &mut AnnotationMappings {
        &mut self.mappings
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Appends a binding for declared type `T`. Registration order is
    /// resolution order.
    pub fn bind<T: ?Sized + Send + Sync + 'static>(&mut self) -> BindingBuilder<'_, T> {
        BindingBuilder::new(self.registry.push(TypeKey::of::<T>()))
    }

    /// Populates `container` and appends its bindings in production order.
    pub fn inherit<C: BinderContainer + ?Sized>(&mut self, container: &C) -> &mut Self {
        let mut binder = ContainerBinder::new();
        container.populate(&mut binder);
        let bindings = binder.into_bindings();
        tracing::debug!(target: "flavor_di", count = bindings.len(), "Inherited bindings");
        self.registry.extend(bindings);
        self
    }

    /// Registers `handler` for methods annotated with `A`. It runs for
    /// every such method of each type going through an injection pass. A
    /// second handler for the same kind replaces the first.
    pub fn listen<A: Any>(
        &mut self,
        handler: impl Fn(&MethodSite, &AnyArc) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> &mut Self {
        let handler: ScannerHandler = Arc::new(handler);
        self.scanners.insert(TypeKey::of::<A>(), handler);
        self
    }

    /// The registered service of type `T`.
    pub fn service<T: Send + Sync + 'static>(&self) -> FlavorResult<Arc<T>> {
        self.services
            .get::<T>()
            .ok_or(FlavorError::BindingNotFound(std::any::type_name::<T>()))
    }

    /// Shared handle to the service table.
    pub fn services(&self) -> ServiceTable {
        self.services.clone()
    }

    /// Descriptors of every registered binding, in registration order.
    pub fn bindings(&self) -> Vec<BindingDescriptor> {
        self.registry.iter().map(|b| b.describe()).collect()
    }

    /// Constructs `T` from `args` (or from bindings when `args` is empty and
    /// `T` has an injectable constructor), then injects it.
    ///
    /// The new instance is never a discovered singleton, so
    /// singleton-scoped bindings are skipped.
    pub fn injected<T: Injectable>(&self, args: Args) -> FlavorResult<Arc<T>> {
        let descriptor = T::descriptor();
        let engine = self.engine();
        let instance = engine.instantiate(&descriptor, args, InjectionContext::AD_HOC)?;
        engine.inject(&descriptor, &instance, InjectionContext::AD_HOC)?;
        instance
            .downcast::<T>()
            .map_err(|_| FlavorError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Runs an injection pass over an existing instance.
    ///
    /// The instance counts as discovered only if it is the canonical
    /// singleton of its type.
    pub fn inject<T: Injectable>(&self, instance: &Arc<T>) -> FlavorResult<()> {
        let descriptor = self.descriptor_of::<T>();
        let erased: AnyArc = instance.clone();
        let ctx = InjectionContext::for_target(descriptor.is_singleton_instance(&erased));
        self.engine().inject(&descriptor, &erased, ctx)
    }

    /// Discovers, injects and configures every service in the scan package,
    /// highest priority first. Failures are contained per service.
    pub fn startup(&self) {
        self.scheduler().startup();
    }

    /// Runs the close hook of every registered service, in registration
    /// order. Services already closed are skipped.
    pub fn close(&self) {
        self.scheduler().close();
    }

    /// Serializable snapshot of the service table.
    #[cfg(feature = "report")]
    pub fn report(&self) -> crate::report::ServiceReport {
        crate::report::ServiceReport::from_table(self.package(), &self.services)
    }

    fn descriptor_of<T: Injectable>(&self) -> Arc<TypeDescriptor> {
        self.discovery
            .descriptor_of(&TypeKey::of::<T>())
            .unwrap_or_else(|| Arc::new(T::descriptor()))
    }

    fn engine(&self) -> InjectionEngine<'_> {
        InjectionEngine {
            registry: &self.registry,
            scanners: &self.scanners,
            mappings: &self.mappings,
            options: &self.options,
            observers: &self.observers,
        }
    }

    fn scheduler(&self) -> LifecycleScheduler<'_> {
        LifecycleScheduler {
            engine: self.engine(),
            discovery: &*self.discovery,
            services: &self.services,
            package: self.package(),
        }
    }
}

impl fmt::Debug for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flavor")
            .field("initializer", &self.initializer)
            .field("package", &self.package())
            .field("bindings", &self.registry.len())
            .field("services", &self.services.len())
            .field("scanners", &self.scanners.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
