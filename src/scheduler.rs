//! Service lifecycle: ordered startup, configure and close hooks, and the
//! service table.

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

use crate::annotation::{IgnoreAutoScan, Service};
use crate::descriptors::{MethodSite, TypeDescriptor};
use crate::discovery::DiscoveryProvider;
use crate::engine::InjectionEngine;
use crate::error::FlavorError;
use crate::internal::{contained, tracked};
use crate::key::TypeKey;
use crate::mappings::{AnnotationMappings, AnnotationType};
use crate::observer::LifecyclePhase;
use crate::registration::AnyArc;
use crate::resolver::InjectionContext;

/// Where a service is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ServiceState {
    /// Injected and configured
    Registered,
    /// Injected, but the configure hook failed
    ConfigureFailed,
    Closed,
    CloseFailed,
}

impl ServiceState {
    pub fn is_closed(&self) -> bool {
        matches!(self, ServiceState::Closed | ServiceState::CloseFailed)
    }
}

/// One entry of the service table.
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    key: TypeKey,
    name: String,
    priority: i32,
    instance: AnyArc,
    descriptor: Arc<TypeDescriptor>,
    state: ServiceState,
    configure_time: Option<Duration>,
    close_time: Option<Duration>,
    registered_at: SystemTime,
}

impl ServiceRecord {
    fn new(descriptor: Arc<TypeDescriptor>, instance: AnyArc) -> Self {
        let (name, priority) = service_identity(&descriptor);
        Self {
            key: descriptor.key(),
            name,
            priority,
            instance,
            descriptor,
            state: ServiceState::Registered,
            configure_time: None,
            close_time: None,
            registered_at: SystemTime::now(),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// `Service` name, or the simple type name when blank.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn instance(&self) -> &AnyArc {
        &self.instance
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Duration of the configure hook, when it succeeded.
    pub fn configure_time(&self) -> Option<Duration> {
        self.configure_time
    }

    /// Duration of the close hook, when it succeeded.
    pub fn close_time(&self) -> Option<Duration> {
        self.close_time
    }

    pub fn registered_at(&self) -> SystemTime {
        self.registered_at
    }
}

/// Shared handle to the services registered by `startup()`, in
/// registration order.
///
/// Cloning the handle shares the table, so hooks may hold on to one.
#[derive(Debug, Clone, Default)]
pub struct ServiceTable {
    records: Arc<RwLock<Vec<ServiceRecord>>>,
}

impl ServiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered instance of `T`, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let key = TypeKey::of::<T>();
        let instance = self
            .records
            .read()
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.instance.clone())?;
        instance.downcast::<T>().ok()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_key(&TypeKey::of::<T>())
    }

    pub fn contains_key(&self, key: &TypeKey) -> bool {
        self.records.read().iter().any(|r| r.key == *key)
    }

    /// Snapshot of every record.
    pub fn records(&self) -> Vec<ServiceRecord> {
        self.records.read().clone()
    }

    /// Service names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.records.read().iter().map(|r| r.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Inserts `record`; a record of the same type keeps its position.
    pub(crate) fn register(&self, record: ServiceRecord) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub(crate) fn update(&self, key: TypeKey, f: impl FnOnce(&mut ServiceRecord)) {
        if let Some(record) = self.records.write().iter_mut().find(|r| r.key == key) {
            f(record);
        }
    }
}

/// Display name and priority of a service type.
pub(crate) fn service_identity(descriptor: &TypeDescriptor) -> (String, i32) {
    match descriptor.annotations().get::<Service>() {
        Some(service) if !service.name().is_empty() => {
            (service.name().to_string(), service.get_priority())
        }
        Some(service) => (descriptor.key().simple_name().to_string(), service.get_priority()),
        None => (descriptor.key().simple_name().to_string(), Service::DEFAULT_PRIORITY),
    }
}

fn find_hook<'d>(
    descriptor: &'d TypeDescriptor,
    mappings: &AnnotationMappings,
    kind: AnnotationType,
) -> Option<&'d MethodSite> {
    descriptor
        .methods()
        .iter()
        .find(|m| mappings.matches_any(kind, m.annotations()))
}

/// Drives `startup()` and `close()` over one container's state.
pub(crate) struct LifecycleScheduler<'a> {
    pub(crate) engine: InjectionEngine<'a>,
    pub(crate) discovery: &'a dyn DiscoveryProvider,
    pub(crate) services: &'a ServiceTable,
    pub(crate) package: &'a str,
}

impl<'a> LifecycleScheduler<'a> {
    pub(crate) fn startup(&self) {
        let mut discovered: Vec<_> = self
            .discovery
            .types_with_marker(&TypeKey::of::<Service>())
            .into_iter()
            .filter(|d| d.key().is_in_package(self.package))
            .filter(|d| !d.annotations().contains::<IgnoreAutoScan>())
            .collect();
        // stable: equal priorities keep discovery order
        discovered.sort_by_key(|d| Reverse(service_identity(d).1));

        tracing::debug!(
            target: "flavor_di",
            package = self.package,
            count = discovered.len(),
            "Starting discovered services"
        );

        for descriptor in discovered {
            let type_name = descriptor.key().display_name();
            // guards and anything else not contained further down
            let started = contained(|| {
                self.start(descriptor);
                Ok(())
            });
            if let Err(message) = started {
                self.skip(type_name, message);
            }
        }
    }

    fn start(&self, descriptor: Arc<TypeDescriptor>) {
        let type_name = descriptor.key().display_name();

        let instance = match contained(|| Ok(descriptor.singleton())) {
            Ok(Some(instance)) => instance,
            Ok(None) => {
                return self.skip(type_name, "type exposes no canonical singleton".to_string());
            }
            Err(message) => return self.skip(type_name, message),
        };

        if let Err(err) = self
            .engine
            .inject(&descriptor, &instance, InjectionContext::DISCOVERED)
        {
            return self.skip(type_name, err.to_string());
        }

        let record = ServiceRecord::new(descriptor.clone(), instance.clone());
        let (key, name) = (record.key, record.name.clone());
        self.services.register(record);

        let outcome = match find_hook(&descriptor, self.engine.mappings, AnnotationType::PostConstruct) {
            Some(hook) => tracked(|| hook.invoke(&instance)),
            None => Ok(Duration::ZERO),
        };
        match outcome {
            Ok(elapsed) => {
                self.services.update(key, |r| r.configure_time = Some(elapsed));
                self.engine
                    .observers
                    .hook_completed(&name, LifecyclePhase::Configure, elapsed);
            }
            Err(message) => {
                self.services.update(key, |r| r.state = ServiceState::ConfigureFailed);
                let err = FlavorError::LifecycleHook {
                    service: name.clone(),
                    hook: LifecyclePhase::Configure.as_str(),
                    message,
                };
                self.engine
                    .observers
                    .hook_failed(&name, LifecyclePhase::Configure, &err);
            }
        }
    }

    fn skip(&self, type_name: &'static str, reason: String) {
        let err = FlavorError::DiscoveryProcessing { type_name, reason };
        tracing::error!(target: "flavor_di", error = %err, "Skipping discovered type");
        self.engine.observers.unit_failed(&err);
    }

    /// Runs close hooks in registration order. Records already closed are
    /// left alone.
    pub(crate) fn close(&self) {
        for record in self.services.records() {
            if record.state.is_closed() {
                continue;
            }
            let outcome = match find_hook(&record.descriptor, self.engine.mappings, AnnotationType::PreDestroy) {
                Some(hook) => tracked(|| hook.invoke(&record.instance)),
                None => Ok(Duration::ZERO),
            };
            match outcome {
                Ok(elapsed) => {
                    self.services.update(record.key, |r| {
                        r.state = ServiceState::Closed;
                        r.close_time = Some(elapsed);
                    });
                    self.engine
                        .observers
                        .hook_completed(&record.name, LifecyclePhase::Close, elapsed);
                }
                Err(message) => {
                    self.services.update(record.key, |r| r.state = ServiceState::CloseFailed);
                    let err = FlavorError::LifecycleHook {
                        service: record.name.clone(),
                        hook: LifecyclePhase::Close.as_str(),
                        message,
                    };
                    self.engine
                        .observers
                        .hook_failed(&record.name, LifecyclePhase::Close, &err);
                }
            }
        }
    }
}
