//! The injection engine: resolves sites against the binding registry, runs
//! custom method scanners and builds ad-hoc instances.

use std::collections::HashMap;
use std::sync::Arc;

use crate::annotation::{AnnotationKind, Annotations};
use crate::args::Args;
use crate::descriptors::{ConstructorInput, ConstructorKind, ConstructorSite, MethodSite, TypeDescriptor};
use crate::error::{FlavorError, FlavorResult};
use crate::internal::contained;
use crate::key::TypeKey;
use crate::mappings::{AnnotationMappings, AnnotationType};
use crate::observer::Observers;
use crate::options::{FlavorOptions, UnresolvedPolicy};
use crate::registration::{AnyArc, BindingRegistry};
use crate::resolver::{accepts, scope_allows, InjectionContext};

/// Handler registered with [`Flavor::listen`](crate::Flavor::listen).
///
/// Receives the annotated method and the instance that declares it.
pub type ScannerHandler = Arc<dyn Fn(&MethodSite, &AnyArc) -> anyhow::Result<()> + Send + Sync>;

pub(crate) type ScannerTable = HashMap<AnnotationKind, ScannerHandler>;

/// Borrowed view over the container state one injection pass needs.
pub(crate) struct InjectionEngine<'a> {
    pub(crate) registry: &'a BindingRegistry,
    pub(crate) scanners: &'a ScannerTable,
    pub(crate) mappings: &'a AnnotationMappings,
    pub(crate) options: &'a FlavorOptions,
    pub(crate) observers: &'a Observers,
}

impl<'a> InjectionEngine<'a> {
    /// First binding of `declared` that passes its guards and scope rule.
    pub(crate) fn select(
        &self,
        declared: TypeKey,
        annotations: &Annotations,
        ctx: InjectionContext,
    ) -> Option<AnyArc> {
        self.registry
            .candidates(&declared)
            .filter(|binding| accepts(binding, annotations, self.options.guards))
            .find(|binding| scope_allows(binding, ctx, self.options.singleton_scope))
            .and_then(|binding| binding.value().cloned())
    }

    /// Runs the injection pass over `target`, then the method scanners.
    ///
    /// Under [`UnresolvedPolicy::Fail`] the whole pass still runs; the first
    /// unresolved site is reported afterwards.
    pub(crate) fn inject(
        &self,
        descriptor: &TypeDescriptor,
        target: &AnyArc,
        ctx: InjectionContext,
    ) -> FlavorResult<()> {
        let type_name = descriptor.key().display_name();
        let mut unresolved = None;

        for site in descriptor.sites() {
            if !self.mappings.matches_any(AnnotationType::Inject, site.annotations()) {
                continue;
            }
            match self.select(site.declared_type(), site.annotations(), ctx) {
                Some(value) => {
                    let assigned = contained(|| site.assign(target, &value).map_err(anyhow::Error::new));
                    if let Err(message) = assigned {
                        let err = FlavorError::SiteAssignment {
                            type_name,
                            site: site.name(),
                            message,
                        };
                        tracing::error!(target: "flavor_di", error = %err, "Failed to assign injection site");
                        self.observers.unit_failed(&err);
                    }
                }
                None => {
                    tracing::debug!(
                        target: "flavor_di",
                        type_name,
                        site = site.name(),
                        site_type = site.declared_type().display_name(),
                        "No eligible binding, site left unset"
                    );
                    self.observers.site_unresolved(type_name, site);
                    if self.options.unresolved == UnresolvedPolicy::Fail && unresolved.is_none() {
                        unresolved = Some(FlavorError::UnresolvedSite {
                            type_name,
                            site: site.name(),
                            site_type: site.declared_type().display_name(),
                        });
                    }
                }
            }
        }

        self.scan_methods(descriptor, target);

        match unresolved {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn scan_methods(&self, descriptor: &TypeDescriptor, target: &AnyArc) {
        if self.scanners.is_empty() {
            return;
        }
        for method in descriptor.methods() {
            for annotation in method.annotations() {
                let Some(handler) = self.scanners.get(&annotation.kind()) else {
                    continue;
                };
                if let Err(message) = contained(|| handler(method, target)) {
                    let err = FlavorError::ScannerHandler {
                        marker: annotation.kind().simple_name(),
                        type_name: descriptor.key().display_name(),
                        method: method.name(),
                        message,
                    };
                    tracing::error!(target: "flavor_di", error = %err, "Scanner handler failed");
                    self.observers.unit_failed(&err);
                }
            }
        }
    }

    /// Builds a new instance of the described type.
    ///
    /// With no arguments an injectable constructor is preferred; otherwise
    /// the explicit constructor whose parameter types equal the runtime
    /// types of `args` is used.
    pub(crate) fn instantiate(
        &self,
        descriptor: &TypeDescriptor,
        args: Args,
        ctx: InjectionContext,
    ) -> FlavorResult<AnyArc> {
        let type_name = descriptor.key().display_name();
        let failure = |reason: String| FlavorError::Instantiation { type_name, reason };

        if args.is_empty() {
            let injectable = descriptor
                .constructors()
                .iter()
                .find(|ctor| ctor.kind() == ConstructorKind::Injected);
            if let Some(ctor) = injectable {
                let mut values = Vec::with_capacity(ctor.params().len());
                for param in ctor.params() {
                    let value = self
                        .select(param.declared_type(), param.annotations(), ctx)
                        .ok_or_else(|| {
                            failure(format!(
                                "no eligible binding of {} for constructor parameter",
                                param.declared_type().display_name()
                            ))
                        })?;
                    values.push(value);
                }
                return construct(ctor, ConstructorInput::Bound(values)).map_err(failure);
            }
        }

        let signature = args.signature();
        let ctor = descriptor
            .constructors()
            .iter()
            .filter(|ctor| ctor.kind() == ConstructorKind::Explicit)
            .find(|ctor| ctor.signature().eq(signature.iter().copied()))
            .ok_or_else(|| {
                let names: Vec<_> = signature.iter().map(TypeKey::display_name).collect();
                failure(format!("no constructor accepting ({})", names.join(", ")))
            })?;
        construct(ctor, ConstructorInput::Args(args.into_values())).map_err(failure)
    }
}

fn construct(ctor: &ConstructorSite, input: ConstructorInput) -> Result<AnyArc, String> {
    contained(|| ctor.construct(input))
}
