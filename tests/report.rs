#![cfg(feature = "report")]

use flavor_di::{
    Annotations, Configure, Flavor, FlavorOptions, Service, ServiceReport, ServiceState,
    StaticDiscovery, TypeDescriptor,
};

struct App;

#[derive(Default)]
struct Healthy;

#[derive(Default)]
struct Broken;

fn discovery() -> StaticDiscovery {
    let mut discovery = StaticDiscovery::new();
    discovery
        .register_descriptor(
            TypeDescriptor::builder::<Healthy>()
                .annotated(Service::new().named("healthy").priority(2))
                .method("configure", Annotations::of(Configure), |_| Ok(()))
                .singleton_with(Healthy::default)
                .build(),
        )
        .register_descriptor(
            TypeDescriptor::builder::<Broken>()
                .annotated(Service::new().named("broken"))
                .method("configure", Annotations::of(Configure), |_| {
                    anyhow::bail!("disk full")
                })
                .singleton_with(Broken::default)
                .build(),
        );
    discovery
}

#[test]
fn test_report_reflects_service_table() {
    let flavor = Flavor::with_options::<App>(discovery(), FlavorOptions::new().log_lifecycle(false));
    flavor.startup();

    let report = flavor.report();
    assert_eq!(report.package, "report");
    assert_eq!(report.services.len(), 2);
    assert_eq!(report.services[0].name, "healthy");
    assert_eq!(report.services[0].priority, 2);
    assert_eq!(report.services[0].state, ServiceState::Registered);
    assert!(report.services[0].configure_ms.is_some());

    let failures: Vec<_> = report.failures().map(|s| s.name.as_str()).collect();
    assert_eq!(failures, vec!["broken"]);
}

#[test]
fn test_report_json_survives_parsing() {
    let flavor = Flavor::with_options::<App>(discovery(), FlavorOptions::new().log_lifecycle(false));
    flavor.startup();
    flavor.close();

    let json = flavor.report().to_json().unwrap();
    assert!(json.contains("\"state\": \"closed\""));

    let parsed = ServiceReport::from_json(&json).unwrap();
    assert_eq!(parsed.services.len(), 2);
    assert!(parsed.services.iter().all(|s| s.state.is_closed()));
    assert!(ServiceReport::from_json("{ not json").is_err());
}
