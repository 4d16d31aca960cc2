//! Runtime argument lists for ad-hoc construction.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TypeKey;
use crate::registration::AnyArc;

/// Positional constructor arguments passed to
/// [`Flavor::injected`](crate::Flavor::injected).
///
/// Constructors are matched by the runtime types of the arguments, in order.
/// The [`args!`](crate::args) macro builds one inline.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{args, key_of};
///
/// let args = args!["x".to_string(), 7u8];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.signature(), vec![key_of::<String>(), key_of::<u8>()]);
/// ```
#[derive(Default)]
pub struct Args {
    values: Vec<(TypeKey, Box<dyn Any + Send>)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    pub fn with<A: Any + Send>(mut self, value: A) -> Self {
        self.values.push((TypeKey::of::<A>(), Box::new(value)));
        self
    }

    /// Runtime types of the arguments, in order.
    pub fn signature(&self) -> Vec<TypeKey> {
        self.values.iter().map(|(key, _)| *key).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn into_values(self) -> Vec<Box<dyn Any + Send>> {
        self.values.into_iter().map(|(_, value)| value).collect()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|(key, _)| key.display_name()))
            .finish()
    }
}

/// Builds an [`Args`] list.
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::new()$(.with($value))+
    };
}

/// Tuple of owned constructor arguments, matched against an [`Args`] list.
pub trait FromArgs: Sized {
    /// Expected argument types, in order.
    fn signature() -> Vec<TypeKey>;

    /// Rebuilds the tuple; `None` if a value has the wrong type.
    fn from_args(values: Vec<Box<dyn Any + Send>>) -> Option<Self>;
}

impl FromArgs for () {
    fn signature() -> Vec<TypeKey> {
        Vec::new()
    }

    fn from_args(values: Vec<Box<dyn Any + Send>>) -> Option<Self> {
        values.is_empty().then_some(())
    }
}

macro_rules! impl_from_args {
    ($($name:ident),+) => {
        impl<$($name: Any + Send),+> FromArgs for ($($name,)+) {
            fn signature() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            fn from_args(values: Vec<Box<dyn Any + Send>>) -> Option<Self> {
                let mut values = values.into_iter();
                let tuple = ($(*values.next()?.downcast::<$name>().ok()?,)+);
                values.next().is_none().then_some(tuple)
            }
        }
    };
}

impl_from_args!(A);
impl_from_args!(A, B);
impl_from_args!(A, B, C);
impl_from_args!(A, B, C, D);
impl_from_args!(A, B, C, D, E);

/// Tuple of bound values resolved for an injectable constructor.
///
/// Each element is an `Arc<T>` of a declared type; unsized declared types
/// (`Arc<dyn Trait>`) are supported.
pub trait FromBindings: Sized {
    /// Declared parameter types, in order.
    fn keys() -> Vec<TypeKey>;

    /// Rebuilds the tuple from erased bound values.
    fn from_bindings(values: &[AnyArc]) -> Option<Self>;
}

macro_rules! impl_from_bindings {
    ($len:expr; $($name:ident => $idx:tt),+) => {
        impl<$($name: ?Sized + Send + Sync + 'static),+> FromBindings for ($(Arc<$name>,)+) {
            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            fn from_bindings(values: &[AnyArc]) -> Option<Self> {
                if values.len() != $len {
                    return None;
                }
                Some(($(values[$idx].downcast_ref::<Arc<$name>>()?.clone(),)+))
            }
        }
    };
}

impl_from_bindings!(1; A => 0);
impl_from_bindings!(2; A => 0, B => 1);
impl_from_bindings!(3; A => 0, B => 1, C => 2);
impl_from_bindings!(4; A => 0, B => 1, C => 2, D => 3);
