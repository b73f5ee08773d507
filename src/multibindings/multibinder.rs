//! Binds elements of a sequence contributed to by any number of modules.
//!
//! ```
//! use bindery::binder::Binder;
//! use bindery::multibindings::new_set_binder;
//! # use bindery::inject::Inject;
//! # use bindery::instance_provider::InstanceProvider;
//! # use bindery::error::ResolveError;
//! # trait Snack: Send + Sync {}
//! # struct Twix;
//! # impl Snack for Twix {}
//! # impl Inject for Twix {
//! #     fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
//! #         Ok(Twix)
//! #     }
//! # }
//! # bindery::implements!(Twix => dyn Snack);
//!
//! fn configure(binder: &mut Binder) {
//!     let mut snacks = new_set_binder::<dyn Snack>(binder);
//!     snacks.add_binding().to::<Twix>();
//! }
//! ```
//!
//! The collection is requested as `Vec<InstancePtr<T>>` (or through
//! [Injector::set_of](crate::injector::Injector::set_of)), in registration
//! order across all contributing modules. A provider-wrapped variant is
//! bound alongside under `Vec<Provider<T>>`.

use crate::binder::Binder;
use crate::builder::LinkedBindingBuilder;
use crate::element::{
    BindingElement, Element, SetAssembler, SetBinderElement,
};
use crate::error::Source;
use crate::inject::Injectable;
use crate::instance_provider::{
    unwrap_instance, wrap_instance, InstancePtr, InstanceProvider,
};
use crate::key::{Annotation, BindingAnnotation, Key, RawKey};
use crate::multibindings::{provider_set_key_for, set_key_for};
use crate::provider::{EnvHandle, RawProvider, SharedCore};
use itertools::Itertools;
use std::any::type_name;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Arc;

/// Returns a new multibinder collecting instances of `T` in a sequence.
#[track_caller]
pub fn new_set_binder<T: ?Sized + Injectable>(binder: &mut Binder) -> Multibinder<'_, T> {
    Multibinder::with_key(binder, Key::of(), Location::caller())
}

/// Returns a new multibinder for the sequence annotated with `A`.
#[track_caller]
pub fn new_annotated_set_binder<T: ?Sized + Injectable, A: BindingAnnotation>(
    binder: &mut Binder,
) -> Multibinder<'_, T> {
    Multibinder::with_key(binder, Key::annotated::<A>(), Location::caller())
}

/// Returns a new multibinder for the sequence carrying a textual qualifier.
#[track_caller]
pub fn new_named_set_binder<T: ?Sized + Injectable>(
    binder: &mut Binder,
    name: impl Into<Cow<'static, str>>,
) -> Multibinder<'_, T> {
    Multibinder::with_key(binder, Key::named(name), Location::caller())
}

/// Contributes elements to one sequence slot. Creating the binder for the
/// same key twice, from any module, yields the same underlying slot.
pub struct Multibinder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    set_key: RawKey,
    index: usize,
    _marker: PhantomData<fn(&T)>,
}

impl<'a, T: ?Sized + Injectable> Multibinder<'a, T> {
    fn with_key(binder: &'a mut Binder, base: Key<T>, source: Source) -> Self {
        let set_key = set_key_for(&base).into_raw();

        let index = match binder.seen_set_binders.get(&set_key).copied() {
            Some(index) => index,
            None => {
                let element = SetBinderElement {
                    set_key: set_key.clone(),
                    provider_set_key: provider_set_key_for(&base).into_raw(),
                    permit_duplicates: false,
                    assemble_instances: instance_assembler::<T>(),
                    assemble_providers: provider_assembler::<T>(
                        binder.shared_core(),
                        binder.env_handle(),
                    ),
                    source,
                };
                let index = binder.push_element(Element::SetBinder(element));
                binder.seen_set_binders.insert(set_key.clone(), index);
                index
            }
        };

        Self {
            binder,
            set_key,
            index,
            _marker: PhantomData,
        }
    }

    /// Returns a binding builder adding a new element to the sequence.
    #[track_caller]
    pub fn add_binding(&mut self) -> LinkedBindingBuilder<'_, T> {
        let source = Location::caller();
        let element_key =
            RawKey::of::<T>().with_annotation(Annotation::element(type_name::<T>()));

        let binding_index = self.binder.push_element(Element::Binding(BindingElement {
            key: element_key.clone(),
            target: None,
            scope: None,
            source,
        }));
        self.binder.push_element(Element::SetEntry {
            set_key: self.set_key.clone(),
            element_key,
            source,
        });

        LinkedBindingBuilder::new(self.binder, binding_index)
    }

    /// Configures the sequence to accept several elements with the same
    /// target instead of failing injector creation.
    pub fn permit_duplicates(&mut self) -> &mut Self {
        if let Element::SetBinder(set_binder) = &mut self.binder.elements[self.index] {
            set_binder.permit_duplicates = true;
        }
        self
    }
}

fn instance_assembler<T: ?Sized + Injectable>() -> SetAssembler {
    Arc::new(
        move |provider: &mut dyn InstanceProvider, keys: &[RawKey]| {
            let elements: Vec<InstancePtr<T>> = keys
                .iter()
                .map(|key| {
                    provider
                        .instance_for_key(key)
                        .and_then(|handle| unwrap_instance::<T>(&handle, key))
                })
                .try_collect()?;

            Ok(wrap_instance(InstancePtr::new(elements)))
        },
    )
}

fn provider_assembler<T: ?Sized + Injectable>(core: SharedCore, env: EnvHandle) -> SetAssembler {
    Arc::new(move |_: &mut dyn InstanceProvider, keys: &[RawKey]| {
        let providers = keys
            .iter()
            .map(|key| RawProvider::new(core.clone(), env.clone(), key.clone()).typed::<T>())
            .collect_vec();

        Ok(wrap_instance(InstancePtr::new(providers)))
    })
}
