//! Lifecycle observers.
//!
//! Observers receive the outcome of every configure and close hook, every
//! contained unit failure and every unresolved injection site. The container
//! always logs failures through `tracing`; observers are the hook for
//! anything beyond that (metrics, tests, custom reporting).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::descriptors::InjectionSite;
use crate::error::FlavorError;
use crate::internal::contained;

/// Lifecycle hook kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecyclePhase {
    Configure,
    Close,
}

impl LifecyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Configure => "configure",
            LifecyclePhase::Close => "close",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer of service lifecycle events.
///
/// Calls are made synchronously from `startup`, `close` and the injection
/// engine; keep implementations cheap. A panicking observer is logged and
/// does not stop delivery to the others.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{FlavorError, LifecycleObserver, LifecyclePhase};
/// use std::sync::Mutex;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Journal(Mutex<Vec<String>>);
///
/// impl LifecycleObserver for Journal {
///     fn hook_completed(&self, service: &str, phase: LifecyclePhase, _: Duration) {
///         self.0.lock().unwrap().push(format!("{} {}", phase, service));
///     }
///
///     fn hook_failed(&self, service: &str, phase: LifecyclePhase, _: &FlavorError) {
///         self.0.lock().unwrap().push(format!("{} {} failed", phase, service));
///     }
/// }
///
/// let journal = Journal::default();
/// journal.hook_completed("Cache", LifecyclePhase::Configure, Duration::ZERO);
/// assert_eq!(journal.0.lock().unwrap()[0], "configure Cache");
/// ```
pub trait LifecycleObserver: Send + Sync {
    /// A hook ran to completion (or the service had no such hook).
    fn hook_completed(&self, service: &str, phase: LifecyclePhase, elapsed: Duration);

    /// A hook returned an error or panicked.
    fn hook_failed(&self, service: &str, phase: LifecyclePhase, error: &FlavorError);

    /// A discovered type or scanner handler failed and was skipped.
    fn unit_failed(&self, _error: &FlavorError) {}

    /// An inject-marked site on `type_name` had no eligible binding.
    fn site_unresolved(&self, _type_name: &'static str, _site: &InjectionSite) {}
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    /// Calls every observer, containing a panicking one so the rest still
    /// receive the event.
    fn notify<F>(&self, event: &'static str, f: F)
    where
        F: Fn(&dyn LifecycleObserver),
    {
        for observer in &self.observers {
            let delivered = contained(|| {
                f(observer.as_ref());
                Ok(())
            });
            if let Err(message) = delivered {
                tracing::error!(target: "flavor_di", event, error = %message, "Lifecycle observer failed");
            }
        }
    }

    pub(crate) fn hook_completed(&self, service: &str, phase: LifecyclePhase, elapsed: Duration) {
        self.notify("hook_completed", |o| o.hook_completed(service, phase, elapsed));
    }

    pub(crate) fn hook_failed(&self, service: &str, phase: LifecyclePhase, error: &FlavorError) {
        self.notify("hook_failed", |o| o.hook_failed(service, phase, error));
    }

    pub(crate) fn unit_failed(&self, error: &FlavorError) {
        self.notify("unit_failed", |o| o.unit_failed(error));
    }

    pub(crate) fn site_unresolved(&self, type_name: &'static str, site: &InjectionSite) {
        self.notify("site_unresolved", |o| o.site_unresolved(type_name, site));
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}

/// Logs service load and shutdown lines through `tracing`.
///
/// Installed automatically unless
/// [`FlavorOptions::log_lifecycle`](crate::FlavorOptions::log_lifecycle) is
/// turned off.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    prefix: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::with_prefix("Services")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleObserver for TracingObserver {
    fn hook_completed(&self, service: &str, phase: LifecyclePhase, elapsed: Duration) {
        let verb = match phase {
            LifecyclePhase::Configure => "Loaded",
            LifecyclePhase::Close => "Shutdown",
        };
        tracing::info!(
            target: "flavor_di",
            service,
            elapsed_ms = elapsed.as_millis() as u64,
            "[{}] {} [{}] in {}ms.",
            self.prefix,
            verb,
            service,
            elapsed.as_millis()
        );
    }

    fn hook_failed(&self, service: &str, phase: LifecyclePhase, error: &FlavorError) {
        let verb = match phase {
            LifecyclePhase::Configure => "load",
            LifecyclePhase::Close => "shutdown",
        };
        tracing::error!(
            target: "flavor_di",
            service,
            error = %error,
            "[{}] Failed to {} [{}]!",
            self.prefix,
            verb,
            service
        );
    }
}

/// Counts lifecycle outcomes with relaxed atomics.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    configured: AtomicU64,
    configure_failures: AtomicU64,
    closed: AtomicU64,
    close_failures: AtomicU64,
    unit_failures: AtomicU64,
    unresolved: AtomicU64,
    total_configure_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured(&self) -> u64 {
        self.configured.load(Ordering::Relaxed)
    }

    pub fn configure_failures(&self) -> u64 {
        self.configure_failures.load(Ordering::Relaxed)
    }

    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::Relaxed)
    }

    pub fn close_failures(&self) -> u64 {
        self.close_failures.load(Ordering::Relaxed)
    }

    pub fn unit_failures(&self) -> u64 {
        self.unit_failures.load(Ordering::Relaxed)
    }

    pub fn unresolved(&self) -> u64 {
        self.unresolved.load(Ordering::Relaxed)
    }

    /// Total time spent in successful configure hooks.
    pub fn total_configure_time(&self) -> Duration {
        Duration::from_nanos(self.total_configure_nanos.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        for counter in [
            &self.configured,
            &self.configure_failures,
            &self.closed,
            &self.close_failures,
            &self.unit_failures,
            &self.unresolved,
            &self.total_configure_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl LifecycleObserver for MetricsObserver {
    fn hook_completed(&self, _service: &str, phase: LifecyclePhase, elapsed: Duration) {
        match phase {
            LifecyclePhase::Configure => {
                self.configured.fetch_add(1, Ordering::Relaxed);
                self.total_configure_nanos
                    .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
            }
            LifecyclePhase::Close => {
                self.closed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn hook_failed(&self, _service: &str, phase: LifecyclePhase, _error: &FlavorError) {
        match phase {
            LifecyclePhase::Configure => self.configure_failures.fetch_add(1, Ordering::Relaxed),
            LifecyclePhase::Close => self.close_failures.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn unit_failed(&self, _error: &FlavorError) {
        self.unit_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn site_unresolved(&self, _type_name: &'static str, _site: &InjectionSite) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_observer() {
        let metrics = Arc::new(MetricsObserver::new());
        let mut observers = Observers::new();
        observers.add(metrics.clone());
        observers.add(Arc::new(TracingObserver::new()));
        assert_eq!(observers.len(), 2);

        observers.hook_completed("A", LifecyclePhase::Configure, Duration::from_millis(3));
        observers.hook_completed("B", LifecyclePhase::Configure, Duration::from_millis(4));
        let err = FlavorError::LifecycleHook {
            service: "A".into(),
            hook: "close",
            message: "boom".into(),
        };
        observers.hook_failed("A", LifecyclePhase::Close, &err);
        observers.unit_failed(&err);

        assert_eq!(metrics.configured(), 2);
        assert!(metrics.total_configure_time() >= Duration::from_millis(7));
        assert_eq!(metrics.close_failures(), 1);
        assert_eq!(metrics.closed(), 0);
        assert_eq!(metrics.unit_failures(), 1);

        metrics.reset();
        assert_eq!(metrics.configured(), 0);
        assert_eq!(metrics.total_configure_time(), Duration::ZERO);
    }

    struct Panicky;

    impl LifecycleObserver for Panicky {
        fn hook_completed(&self, _: &str, _: LifecyclePhase, _: Duration) {
            panic!("observer down");
        }

        fn hook_failed(&self, _: &str, _: LifecyclePhase, _: &FlavorError) {}

        fn unit_failed(&self, _error: &FlavorError) {
            panic!("observer down");
        }
    }

    #[test]
    fn test_panicking_observer_does_not_stop_delivery() {
        let metrics = Arc::new(MetricsObserver::new());
        let mut observers = Observers::new();
        observers.add(Arc::new(Panicky));
        observers.add(metrics.clone());

        observers.hook_completed("A", LifecyclePhase::Configure, Duration::ZERO);
        observers.unit_failed(&FlavorError::TypeMismatch("u8"));

        assert_eq!(metrics.configured(), 1);
        assert_eq!(metrics.unit_failures(), 1);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(LifecyclePhase::Configure.to_string(), "configure");
        assert_eq!(LifecyclePhase::Close.as_str(), "close");
    }
}
