//! Binds an optional slot: one module may set a default, another may
//! override it with the actual binding, and consumers can depend on either
//! the value itself or on `Option<InstancePtr<T>>` /
//! `Option<Provider<T>>`, which resolve to `None` while nothing is bound.
//!
//! The default and actual slots live under deterministic derived keys, so a
//! second default for the same slot collides there and fails injector
//! creation like any other duplicate binding.

use crate::binder::Binder;
use crate::builder::LinkedBindingBuilder;
use crate::element::{constructor, BindingElement, Element, OptionalBinderElement};
use crate::error::{ResolveError, Source};
use crate::inject::Injectable;
use crate::instance_provider::{
    unwrap_instance, wrap_instance, InstancePtr, InstanceProvider,
};
use crate::key::{Annotation, BindingAnnotation, BindingRole, Key, RawKey};
use crate::multibindings::{optional_key_for, optional_provider_key_for};
use crate::provider::{Provider, RawProvider};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::panic::Location;

/// Returns a new optional binder for `T`.
#[track_caller]
pub fn new_optional_binder<T: ?Sized + Injectable>(binder: &mut Binder) -> OptionalBinder<'_, T> {
    OptionalBinder::with_key(binder, Key::of(), Location::caller())
}

/// Returns a new optional binder for the slot annotated with `A`.
#[track_caller]
pub fn new_annotated_optional_binder<T: ?Sized + Injectable, A: BindingAnnotation>(
    binder: &mut Binder,
) -> OptionalBinder<'_, T> {
    OptionalBinder::with_key(binder, Key::annotated::<A>(), Location::caller())
}

/// Returns a new optional binder for the slot carrying a textual qualifier.
#[track_caller]
pub fn new_named_optional_binder<T: ?Sized + Injectable>(
    binder: &mut Binder,
    name: impl Into<Cow<'static, str>>,
) -> OptionalBinder<'_, T> {
    OptionalBinder::with_key(binder, Key::named(name), Location::caller())
}

/// Configures one optional slot. Creating the binder for the same key twice,
/// from any module, yields the same underlying slot.
pub struct OptionalBinder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    default_key: RawKey,
    actual_key: RawKey,
    _marker: PhantomData<fn(&T)>,
}

impl<'a, T: ?Sized + Injectable> OptionalBinder<'a, T> {
    fn with_key(binder: &'a mut Binder, base: Key<T>, source: Source) -> Self {
        let base_raw = base.raw().clone();
        let base_annotation = base_raw.annotation().cloned();
        let default_key = RawKey::of::<T>().with_annotation(Annotation::role(
            BindingRole::OptionalDefault,
            base_annotation.clone(),
        ));
        let actual_key = RawKey::of::<T>().with_annotation(Annotation::role(
            BindingRole::OptionalActual,
            base_annotation,
        ));

        if binder.seen_optional_binders.insert(base_raw.clone()) {
            let element = OptionalBinderElement {
                key: base_raw.clone(),
                option_key: optional_key_for(&base).into_raw(),
                option_provider_key: optional_provider_key_for(&base).into_raw(),
                bind_base: base_constructor(
                    base_raw.clone(),
                    actual_key.clone(),
                    default_key.clone(),
                ),
                bind_option: option_constructor::<T>(
                    base_raw.clone(),
                    actual_key.clone(),
                    default_key.clone(),
                ),
                bind_option_provider: option_provider_constructor::<T>(
                    binder,
                    base_raw,
                    actual_key.clone(),
                    default_key.clone(),
                ),
                source,
            };
            binder.push_element(Element::OptionalBinder(element));
        }

        Self {
            binder,
            default_key,
            actual_key,
            _marker: PhantomData,
        }
    }

    /// Returns a binding builder for the default value of the slot, used
    /// when no actual binding is set.
    #[track_caller]
    pub fn set_default(&mut self) -> LinkedBindingBuilder<'_, T> {
        self.bind_role(self.default_key.clone(), Location::caller())
    }

    /// Returns a binding builder for the actual value of the slot,
    /// overriding any default.
    #[track_caller]
    pub fn set_binding(&mut self) -> LinkedBindingBuilder<'_, T> {
        self.bind_role(self.actual_key.clone(), Location::caller())
    }

    fn bind_role(&mut self, key: RawKey, source: Source) -> LinkedBindingBuilder<'_, T> {
        let index = self.binder.push_element(Element::Binding(BindingElement {
            key,
            target: None,
            scope: None,
            source,
        }));
        LinkedBindingBuilder::new(self.binder, index)
    }
}

fn base_constructor(
    base: RawKey,
    actual: RawKey,
    default: RawKey,
) -> crate::element::ConstructorFn {
    constructor(move |ctx| {
        if ctx.has_binding(&actual) {
            ctx.instance_for_key(&actual)
        } else if ctx.has_binding(&default) {
            ctx.instance_for_key(&default)
        } else {
            Err(ResolveError::NoBinding(base.clone()))
        }
    })
}

fn option_constructor<T: ?Sized + Injectable>(
    base: RawKey,
    actual: RawKey,
    default: RawKey,
) -> crate::element::ConstructorFn {
    constructor(move |ctx| {
        let handle = if ctx.has_binding(&actual) {
            Some(ctx.instance_for_key(&actual)?)
        } else if ctx.has_binding(&default) {
            Some(ctx.instance_for_key(&default)?)
        } else {
            None
        };

        match handle {
            Some(handle) => {
                let value = unwrap_instance::<T>(&handle, &base)?;
                Ok(wrap_instance(InstancePtr::new(Some(value))))
            }
            None => Ok(wrap_instance(InstancePtr::new(None::<InstancePtr<T>>))),
        }
    })
}

fn option_provider_constructor<T: ?Sized + Injectable>(
    binder: &Binder,
    base: RawKey,
    actual: RawKey,
    default: RawKey,
) -> crate::element::ConstructorFn {
    let core = binder.shared_core();
    let env = binder.env_handle();
    constructor(move |ctx| {
        if ctx.has_binding(&actual) || ctx.has_binding(&default) {
            let provider =
                RawProvider::new(core.clone(), env.clone(), base.clone()).typed::<T>();
            Ok(wrap_instance(InstancePtr::new(Some(provider))))
        } else {
            Ok(wrap_instance(InstancePtr::new(None::<Provider<T>>)))
        }
    })
}
