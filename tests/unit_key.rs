/// Unit tests for TypeKey

use flavor_di::{key_of, TypeKey};
use std::any::TypeId;
use std::collections::HashSet;

mod outer {
    pub mod inner {
        pub struct Marker;
    }
    pub struct Sibling;
}

trait Plugin {}

#[test]
fn test_key_names() {
    let key = key_of::<String>();
    assert_eq!(key.display_name(), "alloc::string::String");
    assert_eq!(key.simple_name(), "String");
    assert_eq!(key.id(), TypeId::of::<String>());

    assert_eq!(key_of::<Vec<String>>().simple_name(), "Vec");
    assert_eq!(key_of::<outer::inner::Marker>().simple_name(), "Marker");
}

#[test]
fn test_key_package() {
    assert_eq!(key_of::<outer::inner::Marker>().package(), "unit_key::outer::inner");
    assert_eq!(key_of::<outer::Sibling>().package(), "unit_key::outer");
    assert_eq!(key_of::<u32>().package(), "");
}

#[test]
fn test_is_in_package_respects_segment_boundaries() {
    let marker = key_of::<outer::inner::Marker>();
    assert!(marker.is_in_package("unit_key"));
    assert!(marker.is_in_package("unit_key::outer"));
    assert!(marker.is_in_package("unit_key::outer::inner"));
    assert!(marker.is_in_package(""));
    assert!(!marker.is_in_package("unit_key::out"));
    assert!(!marker.is_in_package("unit_key::outer::inner::deeper"));
    assert!(!key_of::<outer::Sibling>().is_in_package("unit_key::outer::inner"));
}

#[test]
fn test_key_equality_by_type_id() {
    assert_eq!(key_of::<String>(), TypeKey::of::<String>());
    assert_ne!(key_of::<String>(), key_of::<&'static str>());
    assert_ne!(key_of::<dyn Plugin>(), key_of::<Box<dyn Plugin>>());

    let set: HashSet<TypeKey> = [key_of::<u8>(), key_of::<u8>(), key_of::<u16>()].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_key_display_uses_full_name() {
    assert_eq!(format!("{}", key_of::<outer::Sibling>()), "unit_key::outer::Sibling");
}
