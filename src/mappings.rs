//! Annotation-kind equivalence table.
//!
//! Several concrete markers may stand for one semantic role: `Configure` and
//! `PostConstruct` both mark a configure hook, for example. The engine never
//! asks "is `Inject` present", it asks the table whether any annotation of
//! the site maps to [`AnnotationType::Inject`].

use std::any::Any;
use std::collections::HashMap;

use crate::annotation::{AnnotationKind, Annotations, Close, Configure, Inject, PostConstruct, PreDestroy};
use crate::key::TypeKey;

/// Semantic annotation roles understood by the container.
///
/// Only the inject marker and the two lifecycle hooks have roles. Qualifier
/// guards are keyed on the exact annotation type a binding was guarded with,
/// so a custom qualifier is used by guarding on it directly
/// (`bind::<T>().annotated::<MyQualifier>(..)`) rather than through this
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Inject,
    PostConstruct,
    PreDestroy,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 3] = [
        AnnotationType::Inject,
        AnnotationType::PostConstruct,
        AnnotationType::PreDestroy,
    ];
}

/// Maps each [`AnnotationType`] to the concrete annotation kinds that spell
/// it.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{AnnotationMappings, AnnotationType, Annotations, PostConstruct};
///
/// // A third-party spelling of @Inject
/// struct Autowired;
///
/// let mut mappings = AnnotationMappings::default();
/// assert!(mappings.matches_any(AnnotationType::PostConstruct, &Annotations::of(PostConstruct)));
/// assert!(!mappings.matches_any(AnnotationType::Inject, &Annotations::of(Autowired)));
///
/// mappings.register::<Autowired>(AnnotationType::Inject);
/// assert!(mappings.matches_any(AnnotationType::Inject, &Annotations::of(Autowired)));
/// ```
#[derive(Debug, Clone)]
pub struct AnnotationMappings {
    mappings: HashMap<AnnotationType, Vec<AnnotationKind>>,
}

impl AnnotationMappings {
    /// Table with no spellings registered at all.
    pub fn empty() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Adds `A` as a spelling of `kind`.
    pub fn register<A: Any>(&mut self, kind: AnnotationType) -> &mut Self {
        self.register_kind(kind, TypeKey::of::<A>())
    }

    /// Adds an erased annotation kind as a spelling of `kind`.
    pub fn register_kind(&mut self, kind: AnnotationType, annotation: AnnotationKind) -> &mut Self {
        let spellings = self.mappings.entry(kind).or_default();
        if !spellings.contains(&annotation) {
            spellings.push(annotation);
        }
        self
    }

    /// Whether `annotation` is one of the spellings of `kind`.
    pub fn matches(&self, kind: AnnotationType, annotation: &AnnotationKind) -> bool {
        self.mappings
            .get(&kind)
            .map(|spellings| spellings.contains(annotation))
            .unwrap_or(false)
    }

    /// Whether any annotation in `annotations` spells `kind`.
    pub fn matches_any(&self, kind: AnnotationType, annotations: &Annotations) -> bool {
        annotations.iter().any(|a| self.matches(kind, &a.kind()))
    }

    /// Spellings registered for `kind`.
    pub fn spellings(&self, kind: AnnotationType) -> &[AnnotationKind] {
        self.mappings.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for AnnotationMappings {
    fn default() -> Self {
        let mut table = Self::empty();
        table
            .register::<Inject>(AnnotationType::Inject)
            .register::<Configure>(AnnotationType::PostConstruct)
            .register::<PostConstruct>(AnnotationType::PostConstruct)
            .register::<Close>(AnnotationType::PreDestroy)
            .register::<PreDestroy>(AnnotationType::PreDestroy);
        table
    }
}
