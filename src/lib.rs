//! # flavor-di
//!
//! Lightweight runtime dependency injection: qualifier-guarded bindings,
//! field/setter/constructor injection, and an ordered service lifecycle.
//!
//! ## Features
//!
//! - **Ordered bindings**: the first eligible binding in registration order wins
//! - **Qualifier guards**: predicates over site annotations such as [`Named`]
//! - **Scopes**: singleton-scoped bindings only reach discovered services
//! - **Service lifecycle**: priority-ordered startup with configure and close hooks
//! - **Failure containment**: a failing hook or handler never stops its siblings
//! - **Custom scanners**: react to your own method annotations with [`Flavor::listen`]
//!
//! Rust has no runtime reflection, so types describe their injection sites
//! once by implementing [`Injectable`]. A [`DiscoveryProvider`] (usually
//! [`StaticDiscovery`]) tells the container which types exist.
//!
//! ## Quick Start
//!
//! ```rust
//! use flavor_di::{args, Annotations, Flavor, Inject, Injectable, Lateinit, StaticDiscovery, TypeDescriptor};
//!
//! struct App;
//!
//! struct Target {
//!     a: String,
//!     b: String,
//!     combined: Lateinit<String>,
//! }
//!
//! impl Injectable for Target {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Target>()
//!             .field::<String>("combined", Annotations::of(Inject), |t, v| t.combined.set(v))
//!             .constructor::<(String, String)>(|(a, b)| {
//!                 Ok(Target { a, b, combined: Lateinit::new() })
//!             })
//!             .build()
//!     }
//! }
//!
//! let mut flavor = Flavor::create::<App>(StaticDiscovery::new());
//! flavor.bind::<String>().to("hello world".to_string());
//!
//! let target = flavor.injected::<Target>(args!["x".to_string(), "y".to_string()]).unwrap();
//! assert_eq!((target.a.as_str(), target.b.as_str()), ("x", "y"));
//! assert_eq!(target.combined.require().unwrap().as_str(), "hello world");
//! ```
//!
//! ## Services
//!
//! ```rust
//! use flavor_di::{Annotations, Configure, Flavor, Injectable, Service, StaticDiscovery, TypeDescriptor};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct App;
//!
//! #[derive(Default)]
//! struct Cache {
//!     warm: AtomicBool,
//! }
//!
//! impl Injectable for Cache {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Cache>()
//!             .annotated(Service::new().priority(10))
//!             .method("configure", Annotations::of(Configure), |c| {
//!                 c.warm.store(true, Ordering::SeqCst);
//!                 Ok(())
//!             })
//!             .singleton_with(Cache::default)
//!             .build()
//!     }
//! }
//!
//! let flavor = Flavor::create::<App>(StaticDiscovery::new().with::<Cache>());
//! flavor.startup();
//!
//! let cache = flavor.service::<Cache>().unwrap();
//! assert!(cache.warm.load(Ordering::SeqCst));
//! flavor.close();
//! ```

pub mod annotation;
pub mod args;
pub mod binder;
pub mod container;
pub mod descriptors;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod key;
pub mod lateinit;
pub mod mappings;
pub mod observer;
pub mod options;
pub mod registration;
pub mod resolver;
pub mod scheduler;
pub mod scope;

#[cfg(feature = "report")]
pub mod report;

// Internal modules
mod internal;

pub use annotation::{
    Annotation, AnnotationKind, Annotations, Close, Configure, Extract, IgnoreAutoScan, Inject,
    Named, PostConstruct, PreDestroy, Service,
};
pub use args::{Args, FromArgs, FromBindings};
pub use binder::{BinderContainer, ContainerBinder, MultiTypeBinder};
pub use container::Flavor;
pub use descriptors::{
    ConstructorKind, ConstructorSite, DescriptorBuilder, Injectable, InjectionSite, MethodSite,
    SiteKind, TypeDescriptor,
};
pub use discovery::{DiscoveryProvider, StaticDiscovery};
pub use engine::ScannerHandler;
pub use error::{FlavorError, FlavorResult};
pub use key::{key_of, TypeKey};
pub use lateinit::Lateinit;
pub use mappings::{AnnotationMappings, AnnotationType};
pub use observer::{LifecycleObserver, LifecyclePhase, MetricsObserver, TracingObserver};
pub use options::{FlavorOptions, GuardPolicy, SingletonScopePolicy, UnresolvedPolicy};
pub use registration::{AnyArc, Binding, BindingBuilder, BindingDescriptor};
pub use resolver::InjectionContext;
pub use scheduler::{ServiceRecord, ServiceState, ServiceTable};
pub use scope::Scope;

#[cfg(feature = "report")]
pub use report::{ServiceEntry, ServiceReport};
