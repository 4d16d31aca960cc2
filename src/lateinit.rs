//! Late-initialised slots for injected state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{FlavorError, FlavorResult};

/// A slot that starts empty and is filled by the injection engine.
///
/// Instances are shared as `Arc<T>` once discovered or constructed, so
/// injected fields need interior mutability. `Lateinit` is the usual field
/// type an injection site assigns into; re-injection overwrites the value.
///
/// # Examples
///
/// ```rust
/// use flavor_di::Lateinit;
/// use std::sync::Arc;
///
/// let slot: Lateinit<String> = Lateinit::new();
/// assert!(slot.get().is_none());
/// assert!(slot.require().is_err());
///
/// slot.set(Arc::new("hello".to_string()));
/// assert_eq!(slot.require().unwrap().as_str(), "hello");
/// ```
pub struct Lateinit<V: ?Sized> {
    slot: RwLock<Option<Arc<V>>>,
}

impl<V: ?Sized> Lateinit<V> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Stores `value`, replacing any previous one.
    pub fn set(&self, value: Arc<V>) {
        *self.slot.write() = Some(value);
    }

    /// Current value, if something was injected.
    pub fn get(&self) -> Option<Arc<V>> {
        self.slot.read().clone()
    }

    /// Current value, or [`FlavorError::Uninitialized`].
    pub fn require(&self) -> FlavorResult<Arc<V>> {
        self.get()
            .ok_or(FlavorError::Uninitialized(std::any::type_name::<V>()))
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<V: ?Sized> Default for Lateinit<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized + fmt::Debug> fmt::Debug for Lateinit<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.slot.read() {
            Some(value) => f.debug_tuple("Lateinit").field(value).finish(),
            None => f.write_str("Lateinit(<uninitialized>)"),
        }
    }
}
