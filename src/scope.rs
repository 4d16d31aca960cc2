//! Binding scopes.

/// Scope of a binding
///
/// Governs whether a binding may be applied outside of discovered-singleton
/// contexts. Which context counts as "discovered" is decided by
/// [`SingletonScopePolicy`](crate::SingletonScopePolicy).
///
/// # Examples
///
/// ```rust
/// use flavor_di::{Flavor, Scope, StaticDiscovery};
///
/// struct App;
///
/// let mut flavor = Flavor::create::<App>(StaticDiscovery::new());
/// // Only ever injected into discovered singletons
/// flavor.bind::<String>().scoped(Scope::Singleton).to("shared".to_string());
/// // Injected everywhere
/// flavor.bind::<u32>().to(8080);
///
/// let scopes: Vec<_> = flavor.bindings().iter().map(|b| b.scope).collect();
/// assert_eq!(scopes, vec![Scope::Singleton, Scope::NoScope]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Applied only when the injection target is a discovered singleton
    Singleton,
    /// Applied to any target, discovered or ad-hoc
    #[default]
    NoScope,
}
