//! Type keys for bindings, services and annotation kinds.

use std::any::TypeId;
use std::fmt;

/// Identity of a declared type.
///
/// Bindings, service records and annotation kinds are all keyed by a
/// `TypeKey`. Equality and hashing only look at the [`TypeId`]; the name is
/// carried along for diagnostics and log output.
///
/// # Examples
///
/// ```rust
/// use flavor_di::{key_of, TypeKey};
///
/// let a = key_of::<String>();
/// let b = TypeKey::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.display_name(), "alloc::string::String");
/// assert_eq!(a.simple_name(), "String");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`. Unsized types such as `dyn Trait` are supported.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    #[inline(always)]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, as reported by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, ignoring generic arguments.
    ///
    /// ```rust
    /// use flavor_di::key_of;
    ///
    /// assert_eq!(key_of::<Vec<String>>().simple_name(), "Vec");
    /// assert_eq!(key_of::<u32>().simple_name(), "u32");
    /// ```
    pub fn simple_name(&self) -> &'static str {
        let base = match self.name.find('<') {
            Some(idx) => &self.name[..idx],
            None => self.name,
        };
        match base.rfind("::") {
            Some(idx) => &base[idx + 2..],
            None => base,
        }
    }

    /// Module path the type is declared in (everything before the last
    /// `::` segment, generic arguments excluded).
    ///
    /// ```rust
    /// use flavor_di::key_of;
    ///
    /// assert_eq!(key_of::<String>().package(), "alloc::string");
    /// assert_eq!(key_of::<u8>().package(), "");
    /// ```
    pub fn package(&self) -> &'static str {
        let base = match self.name.find('<') {
            Some(idx) => &self.name[..idx],
            None => self.name,
        };
        match base.rfind("::") {
            Some(idx) => &base[..idx],
            None => "",
        }
    }

    /// Whether this type lives inside `package` (or one of its submodules).
    /// An empty package contains every type.
    pub fn is_in_package(&self, package: &str) -> bool {
        if package.is_empty() {
            return true;
        }
        let own = self.package();
        own == package
            || (own.starts_with(package) && own[package.len()..].starts_with("::"))
    }
}

// Hot path: TypeId-only comparison, the name is diagnostic only
impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Helper for creating type keys.
#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}
