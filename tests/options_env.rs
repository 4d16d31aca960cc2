use flavor_di::{
    FlavorError, FlavorOptions, GuardPolicy, SingletonScopePolicy, UnresolvedPolicy,
};
use serial_test::serial;
use std::env;

const VARS: [&str; 5] = [
    "FLAVOR_PACKAGE",
    "FLAVOR_SINGLETON_SCOPE",
    "FLAVOR_GUARDS",
    "FLAVOR_UNRESOLVED",
    "FLAVOR_LOG_LIFECYCLE",
];

fn clear() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear();
    let options = FlavorOptions::from_env().unwrap();
    assert_eq!(options, FlavorOptions::default());
}

#[test]
#[serial]
fn test_from_env_reads_every_variable() {
    clear();
    env::set_var("FLAVOR_PACKAGE", "my_app::services");
    env::set_var("FLAVOR_SINGLETON_SCOPE", "discovery_pass");
    env::set_var("FLAVOR_GUARDS", "strict");
    env::set_var("FLAVOR_UNRESOLVED", "fail");
    env::set_var("FLAVOR_LOG_LIFECYCLE", "false");

    let options = FlavorOptions::from_env().unwrap();
    clear();

    assert_eq!(options.package.as_deref(), Some("my_app::services"));
    assert_eq!(options.singleton_scope, SingletonScopePolicy::DiscoveryPass);
    assert_eq!(options.guards, GuardPolicy::Strict);
    assert_eq!(options.unresolved, UnresolvedPolicy::Fail);
    assert!(!options.log_lifecycle);
}

#[test]
#[serial]
fn test_from_env_rejects_malformed_values() {
    clear();
    env::set_var("FLAVOR_GUARDS", "sometimes");
    let result = FlavorOptions::from_env();
    clear();

    match result {
        Err(FlavorError::Config(message)) => assert!(message.contains("sometimes")),
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_custom_prefix() {
    clear();
    env::set_var("MYAPP_UNRESOLVED", "fail");
    let options = FlavorOptions::from_env_with_prefix("myapp").unwrap();
    env::remove_var("MYAPP_UNRESOLVED");

    assert_eq!(options.unresolved, UnresolvedPolicy::Fail);
    assert_eq!(options.guards, GuardPolicy::Lenient);
}
