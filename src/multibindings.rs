//! Multibindings: several modules contributing to one collection-shaped
//! binding slot. [Multibinder](multibinder::Multibinder) gathers elements
//! into a sequence, [MapBinder](map_binder::MapBinder) into a map, and
//! [OptionalBinder](optional_binder::OptionalBinder) models an
//! optional-with-default slot.
//!
//! The derived-key builders here are the whole "type arithmetic" of the
//! feature: pure functions mapping a base key to the keys of the composite
//! slots, preserving the base annotation throughout. The collections are
//! plain Rust types, so the result of a set binder is requested as
//! `Vec<InstancePtr<T>>` and a map as `HashMap<K, InstancePtr<V>>`, each
//! also available provider-wrapped for lazy consumption.

pub mod map_binder;
pub mod multibinder;
pub mod optional_binder;

pub use map_binder::{new_annotated_map_binder, new_map_binder, new_named_map_binder, MapBinder};
pub use multibinder::{
    new_annotated_set_binder, new_named_set_binder, new_set_binder, Multibinder,
};
pub use optional_binder::{
    new_annotated_optional_binder, new_named_optional_binder, new_optional_binder, OptionalBinder,
};

use crate::inject::Injectable;
use crate::instance_provider::InstancePtr;
use crate::key::Key;
use crate::provider::Provider;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bound satisfied by map-binder keys. Blanket implemented.
pub trait MapKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<K: Eq + Hash + Clone + Debug + Send + Sync + 'static> MapKey for K {}

/// Key of the collection bound by the set binder for `base`.
pub fn set_key_for<T: ?Sized + Injectable>(base: &Key<T>) -> Key<Vec<InstancePtr<T>>> {
    base.of_type()
}

/// Key of the provider-wrapped collection bound by the set binder for `base`.
pub fn provider_set_key_for<T: ?Sized + Injectable>(base: &Key<T>) -> Key<Vec<Provider<T>>> {
    base.of_type()
}

/// Key of the map bound by the map binder for `base`.
pub fn map_key_for<K: MapKey, V: ?Sized + Injectable>(
    base: &Key<V>,
) -> Key<HashMap<K, InstancePtr<V>>> {
    base.of_type()
}

/// Key of the provider-wrapped map bound by the map binder for `base`.
pub fn provider_map_key_for<K: MapKey, V: ?Sized + Injectable>(
    base: &Key<V>,
) -> Key<HashMap<K, Provider<V>>> {
    base.of_type()
}

/// Key of the entry list bound by the map binder for `base`, preserving
/// every contribution in registration order.
pub fn entries_key_for<K: MapKey, V: ?Sized + Injectable>(
    base: &Key<V>,
) -> Key<Vec<(K, Provider<V>)>> {
    base.of_type()
}

/// Key of the multimap bound once a map binder permits duplicates.
pub fn multimap_key_for<K: MapKey, V: ?Sized + Injectable>(
    base: &Key<V>,
) -> Key<HashMap<K, Vec<InstancePtr<V>>>> {
    base.of_type()
}

/// Key of the optional slot bound by the optional binder for `base`.
pub fn optional_key_for<T: ?Sized + Injectable>(base: &Key<T>) -> Key<Option<InstancePtr<T>>> {
    base.of_type()
}

/// Key of the provider-wrapped optional slot for `base`.
pub fn optional_provider_key_for<T: ?Sized + Injectable>(
    base: &Key<T>,
) -> Key<Option<Provider<T>>> {
    base.of_type()
}

/// [set_key_for] of the unannotated key for `T`.
pub fn set_key<T: ?Sized + Injectable>() -> Key<Vec<InstancePtr<T>>> {
    set_key_for(&Key::of())
}

/// [provider_set_key_for] of the unannotated key for `T`.
pub fn provider_set_key<T: ?Sized + Injectable>() -> Key<Vec<Provider<T>>> {
    provider_set_key_for(&Key::of())
}

/// [map_key_for] of the unannotated key for `V`.
pub fn map_key<K: MapKey, V: ?Sized + Injectable>() -> Key<HashMap<K, InstancePtr<V>>> {
    map_key_for(&Key::of())
}

/// [provider_map_key_for] of the unannotated key for `V`.
pub fn provider_map_key<K: MapKey, V: ?Sized + Injectable>() -> Key<HashMap<K, Provider<V>>> {
    provider_map_key_for(&Key::of())
}

/// [entries_key_for] of the unannotated key for `V`.
pub fn entries_key<K: MapKey, V: ?Sized + Injectable>() -> Key<Vec<(K, Provider<V>)>> {
    entries_key_for(&Key::of())
}

/// [multimap_key_for] of the unannotated key for `V`.
pub fn multimap_key<K: MapKey, V: ?Sized + Injectable>() -> Key<HashMap<K, Vec<InstancePtr<V>>>> {
    multimap_key_for(&Key::of())
}

/// [optional_key_for] of the unannotated key for `T`.
pub fn optional_key<T: ?Sized + Injectable>() -> Key<Option<InstancePtr<T>>> {
    optional_key_for(&Key::of())
}

/// [optional_provider_key_for] of the unannotated key for `T`.
pub fn optional_provider_key<T: ?Sized + Injectable>() -> Key<Option<Provider<T>>> {
    optional_provider_key_for(&Key::of())
}
