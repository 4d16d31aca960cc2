//! Qualifier and scope checks for a (binding, site) pair.
//!
//! Everything here is pure: no caching, no logging.

use crate::annotation::Annotations;
use crate::options::{GuardPolicy, SingletonScopePolicy};
use crate::registration::Binding;
use crate::scope::Scope;

/// Where an injection pass is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionContext {
    /// The target is a discovered canonical singleton
    pub discovered_target: bool,
    /// The pass runs as part of `startup()`
    pub discovery_pass: bool,
}

impl InjectionContext {
    /// Startup pass over a discovered service.
    pub const DISCOVERED: Self = Self {
        discovered_target: true,
        discovery_pass: true,
    };

    /// Object built or handed in by the caller.
    pub const AD_HOC: Self = Self {
        discovered_target: false,
        discovery_pass: false,
    };

    /// `inject` called on an instance after startup.
    pub fn for_target(is_discovered_singleton: bool) -> Self {
        Self {
            discovered_target: is_discovered_singleton,
            discovery_pass: false,
        }
    }
}

/// Whether `binding`'s guards accept a site carrying `annotations`.
pub fn accepts(binding: &Binding, annotations: &Annotations, policy: GuardPolicy) -> bool {
    if policy == GuardPolicy::Strict
        && binding.guard_kinds().any(|kind| !annotations.contains_kind(&kind))
    {
        return false;
    }
    annotations.iter().all(|annotation| {
        binding
            .guard_for(&annotation.kind())
            .map(|guard| guard(annotation.as_any()))
            .unwrap_or(true)
    })
}

/// Whether `binding`'s scope allows applying it in `ctx`.
pub fn scope_allows(binding: &Binding, ctx: InjectionContext, policy: SingletonScopePolicy) -> bool {
    match binding.scope() {
        Scope::NoScope => true,
        Scope::Singleton => match policy {
            SingletonScopePolicy::DiscoveredTarget => ctx.discovered_target,
            SingletonScopePolicy::DiscoveryPass => ctx.discovery_pass,
        },
    }
}
