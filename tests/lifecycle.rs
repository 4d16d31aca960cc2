use flavor_di::{
    Annotations, Close, Configure, Flavor, FlavorError, FlavorOptions, IgnoreAutoScan, Inject,
    Lateinit, LifecycleObserver, LifecyclePhase, MetricsObserver, PostConstruct, PreDestroy,
    Service, ServiceState, StaticDiscovery, TypeDescriptor, TypeKey, UnresolvedPolicy,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Journal = Arc<Mutex<Vec<String>>>;

struct App;

#[derive(Default)]
struct Alpha;
#[derive(Default)]
struct Beta;
#[derive(Default)]
struct Gamma;
#[derive(Default)]
struct Delta;

/// Service descriptor whose hooks write "<phase>:<name>" into `journal`.
fn journaled<T: Default + Send + Sync + 'static>(service: Service, journal: &Journal) -> TypeDescriptor {
    let name = TypeKey::of::<T>().simple_name();
    let on_configure = journal.clone();
    let on_close = journal.clone();
    TypeDescriptor::builder::<T>()
        .annotated(service)
        .method("configure", Annotations::of(Configure), move |_| {
            on_configure.lock().unwrap().push(format!("configure:{}", name));
            Ok(())
        })
        .method("close", Annotations::of(Close), move |_| {
            on_close.lock().unwrap().push(format!("close:{}", name));
            Ok(())
        })
        .singleton_with(T::default)
        .build()
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[test]
fn test_startup_orders_by_priority_then_discovery() {
    let journal = Journal::default();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal))
        .register_descriptor(journaled::<Beta>(Service::new().priority(5), &journal))
        .register_descriptor(journaled::<Gamma>(Service::new(), &journal))
        .register_descriptor(journaled::<Delta>(Service::new().priority(-2), &journal));

    let flavor = Flavor::create::<App>(discovery);
    flavor.startup();

    assert_eq!(
        entries(&journal),
        vec!["configure:Beta", "configure:Alpha", "configure:Gamma", "configure:Delta"]
    );
    assert_eq!(flavor.services().names(), vec!["Beta", "Alpha", "Gamma", "Delta"]);
}

#[test]
fn test_close_runs_once_in_registration_order() {
    let journal = Journal::default();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal))
        .register_descriptor(journaled::<Beta>(Service::new().priority(3), &journal));

    let flavor = Flavor::create::<App>(discovery);
    flavor.startup();
    journal.lock().unwrap().clear();

    flavor.close();
    flavor.close();
    assert_eq!(entries(&journal), vec!["close:Beta", "close:Alpha"]);
    assert!(flavor
        .services()
        .records()
        .iter()
        .all(|r| r.state() == ServiceState::Closed && r.close_time().is_some()));
}

#[test]
fn test_alternative_hook_spellings() {
    let journal = Journal::default();
    let (configured, closed) = (journal.clone(), journal.clone());
    let descriptor = TypeDescriptor::builder::<Alpha>()
        .annotated(Service::new())
        .method("post_construct", Annotations::of(PostConstruct), move |_| {
            configured.lock().unwrap().push("post_construct".into());
            Ok(())
        })
        .method("pre_destroy", Annotations::of(PreDestroy), move |_| {
            closed.lock().unwrap().push("pre_destroy".into());
            Ok(())
        })
        .singleton_with(Alpha::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery.register_descriptor(descriptor);

    let flavor = Flavor::create::<App>(discovery);
    flavor.startup();
    flavor.close();
    assert_eq!(entries(&journal), vec!["post_construct", "pre_destroy"]);
}

#[test]
fn test_configure_failure_is_isolated() {
    let journal = Journal::default();
    let failing = TypeDescriptor::builder::<Beta>()
        .annotated(Service::new().priority(10))
        .method("configure", Annotations::of(Configure), |_| anyhow::bail!("no database"))
        .singleton_with(Beta::default)
        .build();
    let panicking = TypeDescriptor::builder::<Gamma>()
        .annotated(Service::new().priority(9))
        .method("configure", Annotations::of(Configure), |_| panic!("boom"))
        .singleton_with(Gamma::default)
        .build();

    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(failing)
        .register_descriptor(panicking)
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal));

    let metrics = Arc::new(MetricsObserver::new());
    let mut flavor = Flavor::create::<App>(discovery);
    flavor.add_observer(metrics.clone());
    flavor.startup();

    assert_eq!(entries(&journal), vec!["configure:Alpha"]);
    assert_eq!(metrics.configure_failures(), 2);
    assert_eq!(metrics.configured(), 1);

    // failed services stay registered
    let states: Vec<_> = flavor.services().records().iter().map(|r| r.state()).collect();
    assert_eq!(
        states,
        vec![ServiceState::ConfigureFailed, ServiceState::ConfigureFailed, ServiceState::Registered]
    );
    assert!(flavor.service::<Beta>().is_ok());
}

#[test]
fn test_close_failure_does_not_stop_others() {
    let journal = Journal::default();
    let failing = TypeDescriptor::builder::<Beta>()
        .annotated(Service::new().priority(10))
        .method("close", Annotations::of(Close), |_| anyhow::bail!("stuck"))
        .singleton_with(Beta::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(failing)
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal));

    let metrics = Arc::new(MetricsObserver::new());
    let mut flavor = Flavor::create::<App>(discovery);
    flavor.add_observer(metrics.clone());
    flavor.startup();
    flavor.close();

    assert_eq!(entries(&journal), vec!["configure:Alpha", "close:Alpha"]);
    assert_eq!(metrics.close_failures(), 1);
    assert_eq!(metrics.closed(), 1);
    assert_eq!(flavor.services().records()[0].state(), ServiceState::CloseFailed);

    // a failed close is not retried
    flavor.close();
    assert_eq!(metrics.close_failures(), 1);
}

#[test]
fn test_service_without_hooks() {
    let descriptor = TypeDescriptor::builder::<Delta>()
        .annotated(Service::new().named("Plain"))
        .singleton_with(Delta::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery.register_descriptor(descriptor);

    let metrics = Arc::new(MetricsObserver::new());
    let mut flavor = Flavor::create::<App>(discovery);
    flavor.add_observer(metrics.clone());
    flavor.startup();
    flavor.close();

    assert_eq!(flavor.services().names(), vec!["Plain"]);
    assert_eq!(metrics.configured(), 1);
    assert_eq!(metrics.closed(), 1);
}

#[test]
fn test_ignore_auto_scan_is_never_registered() {
    let journal = Journal::default();
    let ignored = TypeDescriptor::builder::<Beta>()
        .annotated(Service::new())
        .annotated(IgnoreAutoScan)
        .singleton_with(Beta::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(ignored)
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal));

    let flavor = Flavor::create::<App>(discovery);
    flavor.startup();
    assert!(flavor.service::<Alpha>().is_ok());
    assert!(matches!(flavor.service::<Beta>(), Err(FlavorError::BindingNotFound(_))));
}

#[test]
fn test_type_without_singleton_is_skipped() {
    let journal = Journal::default();
    let broken = TypeDescriptor::builder::<Beta>()
        .annotated(Service::new().priority(4))
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(broken)
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal));

    let metrics = Arc::new(MetricsObserver::new());
    let mut flavor = Flavor::create::<App>(discovery);
    flavor.add_observer(metrics.clone());
    flavor.startup();

    assert_eq!(metrics.unit_failures(), 1);
    assert_eq!(flavor.services().names(), vec!["Alpha"]);
}

mod inside {
    #[derive(Default)]
    pub struct Kept;

    pub struct Root;
}

#[test]
fn test_startup_is_scoped_to_package() {
    let journal = Journal::default();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal))
        .register_descriptor(journaled::<inside::Kept>(Service::new(), &journal));

    // initializer's module path
    let scoped = Flavor::create::<inside::Root>(Arc::new(discovery));
    assert_eq!(scoped.package(), "lifecycle::inside");
    scoped.startup();
    assert_eq!(scoped.services().names(), vec!["Kept"]);
}

#[test]
fn test_package_option_overrides_initializer() {
    let journal = Journal::default();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal))
        .register_descriptor(journaled::<inside::Kept>(Service::new(), &journal));

    let options = FlavorOptions::new().package("lifecycle");
    let flavor = Flavor::with_options::<inside::Root>(discovery, options);
    flavor.startup();
    assert_eq!(flavor.services().len(), 2);
}

#[derive(Default)]
struct Consumer {
    dependency: Lateinit<u64>,
}

#[test]
fn test_injection_happens_before_configure() {
    let seen = Arc::new(Mutex::new(None));
    let record = seen.clone();
    let descriptor = TypeDescriptor::builder::<Consumer>()
        .annotated(Service::new())
        .field::<u64>("dependency", Annotations::of(Inject), |c, v| c.dependency.set(v))
        .method("configure", Annotations::of(Configure), move |c| {
            *record.lock().unwrap() = c.dependency.get().map(|v| *v);
            Ok(())
        })
        .singleton_with(Consumer::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery.register_descriptor(descriptor);

    let mut flavor = Flavor::create::<App>(discovery);
    flavor.bind::<u64>().to(99);
    flavor.startup();
    assert_eq!(*seen.lock().unwrap(), Some(99));
}

#[test]
fn test_unresolved_fail_skips_service_in_startup() {
    let descriptor = TypeDescriptor::builder::<Consumer>()
        .annotated(Service::new())
        .field::<u64>("dependency", Annotations::of(Inject), |c, v| c.dependency.set(v))
        .singleton_with(Consumer::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery.register_descriptor(descriptor);

    let metrics = Arc::new(MetricsObserver::new());
    let options = FlavorOptions::new().unresolved(UnresolvedPolicy::Fail);
    let mut flavor = Flavor::with_options::<App>(discovery, options);
    flavor.add_observer(metrics.clone());
    flavor.startup();

    assert!(flavor.services().is_empty());
    assert_eq!(metrics.unresolved(), 1);
    assert_eq!(metrics.unit_failures(), 1);
}

#[test]
fn test_panicking_setter_does_not_stop_later_services() {
    let journal = Journal::default();
    let fragile = TypeDescriptor::builder::<Consumer>()
        .annotated(Service::new().priority(10))
        .setter::<u64>("set_dependency", Annotations::of(Inject), |c, v| {
            if *v == 0 {
                panic!("dependency must be non-zero");
            }
            c.dependency.set(v)
        })
        .singleton_with(Consumer::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(fragile)
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal));

    let metrics = Arc::new(MetricsObserver::new());
    let mut flavor = Flavor::create::<App>(discovery);
    flavor.add_observer(metrics.clone());
    flavor.bind::<u64>().to(0);
    flavor.startup();

    assert_eq!(entries(&journal), vec!["configure:Alpha"]);
    assert_eq!(metrics.unit_failures(), 1);
    // the failed site is left unset, the rest of the pass still ran
    assert_eq!(flavor.services().names(), vec!["Consumer", "Alpha"]);
    assert!(!flavor.service::<Consumer>().unwrap().dependency.is_initialized());
}

#[test]
fn test_panicking_guard_skips_only_its_service() {
    let journal = Journal::default();
    let descriptor = TypeDescriptor::builder::<Consumer>()
        .annotated(Service::new().priority(10))
        .field::<u64>("dependency", Annotations::of(Inject), |c, v| c.dependency.set(v))
        .singleton_with(Consumer::default)
        .build();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(descriptor)
        .register_descriptor(journaled::<Alpha>(Service::new(), &journal));

    let metrics = Arc::new(MetricsObserver::new());
    let mut flavor = Flavor::create::<App>(discovery);
    flavor.add_observer(metrics.clone());
    flavor
        .bind::<u64>()
        .annotated::<Inject>(|_| panic!("guard exploded"))
        .to(5);
    flavor.startup();

    assert_eq!(entries(&journal), vec!["configure:Alpha"]);
    assert_eq!(metrics.unit_failures(), 1);
    assert_eq!(flavor.services().names(), vec!["Alpha"]);
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(String, LifecyclePhase, bool)>>);

impl LifecycleObserver for Recorder {
    fn hook_completed(&self, service: &str, phase: LifecyclePhase, _elapsed: Duration) {
        self.0.lock().unwrap().push((service.to_string(), phase, true));
    }

    fn hook_failed(&self, service: &str, phase: LifecyclePhase, error: &FlavorError) {
        assert!(error.is_contained());
        self.0.lock().unwrap().push((service.to_string(), phase, false));
    }
}

#[test]
fn test_observer_sees_one_event_per_hook() {
    let journal = Journal::default();
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(journaled::<Alpha>(Service::new().named("First"), &journal))
        .register_descriptor(journaled::<Beta>(Service::new(), &journal));

    let recorder = Arc::new(Recorder::default());
    let mut flavor = Flavor::with_options::<App>(discovery, FlavorOptions::new().log_lifecycle(false));
    flavor.add_observer(recorder.clone());
    flavor.startup();
    flavor.close();

    let events = recorder.0.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            ("First".to_string(), LifecyclePhase::Configure, true),
            ("Beta".to_string(), LifecyclePhase::Configure, true),
            ("First".to_string(), LifecyclePhase::Close, true),
            ("Beta".to_string(), LifecyclePhase::Close, true),
        ]
    );
}
