//! Error types for the injection container.

use thiserror::Error;

/// Container errors
///
/// Only [`BindingNotFound`](FlavorError::BindingNotFound),
/// [`Instantiation`](FlavorError::Instantiation) and
/// [`UnresolvedSite`](FlavorError::UnresolvedSite) ever reach the caller of
/// the public API. The remaining variants describe failures of a single unit
/// (one hook, one handler, one site, one discovered type); they are contained by the
/// engine and scheduler, logged, and handed to observers.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{Flavor, FlavorError, StaticDiscovery};
///
/// struct Missing;
///
/// let flavor = Flavor::create::<Missing>(StaticDiscovery::new());
/// match flavor.service::<Missing>() {
///     Err(FlavorError::BindingNotFound(name)) => assert!(name.ends_with("Missing")),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum FlavorError {
    /// `service::<T>()` for a type that was never registered as a service
    #[error("Binding not found: {0}")]
    BindingNotFound(&'static str),

    /// No matching constructor, or construction failed
    #[error("Failed to instantiate {type_name}: {reason}")]
    Instantiation {
        type_name: &'static str,
        reason: String,
    },

    /// A configure/close hook returned an error or panicked
    #[error("{hook} hook of service [{service}] failed: {message}")]
    LifecycleHook {
        service: String,
        hook: &'static str,
        message: String,
    },

    /// A discovered type could not be processed during startup
    #[error("Could not process discovered type {type_name}: {reason}")]
    DiscoveryProcessing {
        type_name: &'static str,
        reason: String,
    },

    /// A handler registered through `listen` returned an error or panicked
    #[error("Scanner for @{marker} failed on {type_name}::{method}: {message}")]
    ScannerHandler {
        marker: &'static str,
        type_name: &'static str,
        method: &'static str,
        message: String,
    },

    /// A field or setter closure returned an error or panicked
    #[error("Failed to assign {type_name}::{site}: {message}")]
    SiteAssignment {
        type_name: &'static str,
        site: &'static str,
        message: String,
    },

    /// An inject-marked site had no eligible binding (strict policy only)
    #[error("No binding of {site_type} satisfied {type_name}::{site}")]
    UnresolvedSite {
        type_name: &'static str,
        site: &'static str,
        site_type: &'static str,
    },

    /// Type-erased value did not downcast to the declared type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),

    /// A lateinit slot was read before anything was injected into it
    #[error("Lateinit slot of {0} has not been initialized")]
    Uninitialized(&'static str),

    /// Options could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlavorError {
    /// Whether the error is contained by the container rather than surfaced
    /// to the immediate caller.
    pub fn is_contained(&self) -> bool {
        matches!(
            self,
            FlavorError::LifecycleHook { .. }
                | FlavorError::DiscoveryProcessing { .. }
                | FlavorError::ScannerHandler { .. }
                | FlavorError::SiteAssignment { .. }
        )
    }
}

/// Result type for container operations
pub type FlavorResult<T> = Result<T, FlavorError>;
