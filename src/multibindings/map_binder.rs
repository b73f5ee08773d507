//! Binds entries of a map contributed to by any number of modules.
//!
//! The map is requested as `HashMap<K, InstancePtr<V>>` (or through
//! [Injector::map_of](crate::injector::Injector::map_of)). A provider-wrapped
//! map and the flat entry list are bound alongside; once duplicates are
//! permitted, so is the multimap `HashMap<K, Vec<InstancePtr<V>>>` holding
//! every contribution per key in registration order.

use crate::binder::Binder;
use crate::builder::LinkedBindingBuilder;
use crate::element::{
    BindingElement, Element, MapAssembler, MapBinderElement, MapEntryCheck, MapEntryRecord,
};
use crate::error::{CreationError, ResolveError, Source};
use crate::inject::Injectable;
use crate::instance_provider::{
    unwrap_instance, wrap_instance, InstancePtr, InstanceProvider,
};
use crate::key::{Annotation, BindingAnnotation, Key, RawKey};
use crate::multibindings::{
    entries_key_for, map_key_for, multimap_key_for, provider_map_key_for, MapKey,
};
use crate::provider::{EnvHandle, Provider, RawProvider, SharedCore};
use std::any::type_name;
use std::borrow::Cow;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Arc;

/// Returns a new map binder collecting values of `V` under keys of `K`.
#[track_caller]
pub fn new_map_binder<K: MapKey, V: ?Sized + Injectable>(
    binder: &mut Binder,
) -> MapBinder<'_, K, V> {
    MapBinder::with_key(binder, Key::of(), Location::caller())
}

/// Returns a new map binder for the map annotated with `A`.
#[track_caller]
pub fn new_annotated_map_binder<K: MapKey, V: ?Sized + Injectable, A: BindingAnnotation>(
    binder: &mut Binder,
) -> MapBinder<'_, K, V> {
    MapBinder::with_key(binder, Key::annotated::<A>(), Location::caller())
}

/// Returns a new map binder for the map carrying a textual qualifier.
#[track_caller]
pub fn new_named_map_binder<K: MapKey, V: ?Sized + Injectable>(
    binder: &mut Binder,
    name: impl Into<Cow<'static, str>>,
) -> MapBinder<'_, K, V> {
    MapBinder::with_key(binder, Key::named(name), Location::caller())
}

/// Contributes entries to one map slot. Creating the binder for the same key
/// twice, from any module, yields the same underlying slot.
pub struct MapBinder<'a, K, V: ?Sized> {
    binder: &'a mut Binder,
    map_key: RawKey,
    index: usize,
    _marker: PhantomData<(fn(&K), fn(&V))>,
}

impl<'a, K: MapKey, V: ?Sized + Injectable> MapBinder<'a, K, V> {
    fn with_key(binder: &'a mut Binder, base: Key<V>, source: Source) -> Self {
        let map_key = map_key_for::<K, V>(&base).into_raw();

        let index = match binder.seen_map_binders.get(&map_key).copied() {
            Some(index) => index,
            None => {
                let element = MapBinderElement {
                    map_key: map_key.clone(),
                    provider_map_key: provider_map_key_for::<K, V>(&base).into_raw(),
                    entries_key: entries_key_for::<K, V>(&base).into_raw(),
                    multimap_key: multimap_key_for::<K, V>(&base).into_raw(),
                    permit_duplicates: false,
                    assemble_map: map_assembler::<K, V>(),
                    assemble_provider_map: provider_map_assembler::<K, V>(
                        binder.shared_core(),
                        binder.env_handle(),
                    ),
                    assemble_entries: entries_assembler::<K, V>(
                        binder.shared_core(),
                        binder.env_handle(),
                    ),
                    assemble_multimap: multimap_assembler::<K, V>(),
                    check_entries: entry_check::<K>(),
                    source,
                };
                let index = binder.push_element(Element::MapBinder(element));
                binder.seen_map_binders.insert(map_key.clone(), index);
                index
            }
        };

        Self {
            binder,
            map_key,
            index,
            _marker: PhantomData,
        }
    }

    /// Returns a binding builder adding the value bound under `entry`.
    #[track_caller]
    pub fn add_binding(&mut self, entry: K) -> LinkedBindingBuilder<'_, V> {
        let source = Location::caller();
        let value_key =
            RawKey::of::<V>().with_annotation(Annotation::element(type_name::<V>()));

        let binding_index = self.binder.push_element(Element::Binding(BindingElement {
            key: value_key.clone(),
            target: None,
            scope: None,
            source,
        }));
        self.binder.push_element(Element::MapEntry {
            map_key: self.map_key.clone(),
            record: MapEntryRecord {
                entry: Box::new(entry),
                value_key,
                source,
            },
        });

        LinkedBindingBuilder::new(self.binder, binding_index)
    }

    /// Configures the map to accept several entries per key. The flat map
    /// keeps the last contribution per key; the multimap bound alongside
    /// keeps them all.
    pub fn permit_duplicates(&mut self) -> &mut Self {
        if let Element::MapBinder(map_binder) = &mut self.binder.elements[self.index] {
            map_binder.permit_duplicates = true;
        }
        self
    }
}

fn entry_of<K: MapKey>(record: &MapEntryRecord) -> Result<&K, ResolveError> {
    record
        .entry
        .downcast_ref::<K>()
        .ok_or_else(|| ResolveError::IncompatibleInstance(record.value_key.clone()))
}

fn map_assembler<K: MapKey, V: ?Sized + Injectable>() -> MapAssembler {
    Arc::new(
        move |provider: &mut dyn InstanceProvider, records: &[MapEntryRecord]| {
            let mut map: HashMap<K, InstancePtr<V>> = HashMap::with_capacity(records.len());
            for record in records {
                let entry = entry_of::<K>(record)?;
                let value = provider
                    .instance_for_key(&record.value_key)
                    .and_then(|handle| unwrap_instance::<V>(&handle, &record.value_key))?;
                map.insert(entry.clone(), value);
            }

            Ok(wrap_instance(InstancePtr::new(map)))
        },
    )
}

fn multimap_assembler<K: MapKey, V: ?Sized + Injectable>() -> MapAssembler {
    Arc::new(
        move |provider: &mut dyn InstanceProvider, records: &[MapEntryRecord]| {
            let mut map: HashMap<K, Vec<InstancePtr<V>>> = HashMap::new();
            for record in records {
                let entry = entry_of::<K>(record)?;
                let value = provider
                    .instance_for_key(&record.value_key)
                    .and_then(|handle| unwrap_instance::<V>(&handle, &record.value_key))?;
                map.entry(entry.clone()).or_default().push(value);
            }

            Ok(wrap_instance(InstancePtr::new(map)))
        },
    )
}

fn provider_map_assembler<K: MapKey, V: ?Sized + Injectable>(
    core: SharedCore,
    env: EnvHandle,
) -> MapAssembler {
    Arc::new(
        move |_: &mut dyn InstanceProvider, records: &[MapEntryRecord]| {
            let mut map: HashMap<K, Provider<V>> = HashMap::with_capacity(records.len());
            for record in records {
                let entry = entry_of::<K>(record)?;
                map.insert(
                    entry.clone(),
                    RawProvider::new(core.clone(), env.clone(), record.value_key.clone())
                        .typed::<V>(),
                );
            }

            Ok(wrap_instance(InstancePtr::new(map)))
        },
    )
}

fn entries_assembler<K: MapKey, V: ?Sized + Injectable>(
    core: SharedCore,
    env: EnvHandle,
) -> MapAssembler {
    Arc::new(
        move |_: &mut dyn InstanceProvider, records: &[MapEntryRecord]| {
            let mut entries: Vec<(K, Provider<V>)> = Vec::with_capacity(records.len());
            for record in records {
                let entry = entry_of::<K>(record)?;
                entries.push((
                    entry.clone(),
                    RawProvider::new(core.clone(), env.clone(), record.value_key.clone())
                        .typed::<V>(),
                ));
            }

            Ok(wrap_instance(InstancePtr::new(entries)))
        },
    )
}

fn entry_check<K: MapKey>() -> MapEntryCheck {
    Arc::new(|map_key: &RawKey, records: &[MapEntryRecord]| {
        let mut seen: HashMap<&K, Source> = HashMap::with_capacity(records.len());
        for record in records {
            let Some(entry) = record.entry.downcast_ref::<K>() else {
                debug_assert!(false, "map entry key must match the map's key type");
                continue;
            };
            if let Some(&first) = seen.get(entry) {
                return Err(CreationError::DuplicateMapKey {
                    map: map_key.clone(),
                    entry: format!("{entry:?}"),
                    first,
                    second: record.source,
                });
            }
            seen.insert(entry, record.source);
        }

        Ok(())
    })
}
