//! Chained binding builders returned by [Binder::bind](crate::binder::Binder::bind).
//! Each builder is a thin view onto the binding element recorded by the
//! binder; the chained calls fill in the annotation, the target, and the
//! scope.

use crate::binder::Binder;
use crate::element::{constructor, BindingElement, Element, TargetId};
use crate::error::ResolveError;
use crate::inject::{Inject, Injectable, TypedProvider, Upcast};
use crate::instance_provider::{
    unwrap_instance, wrap_instance, InstancePtr, InstanceProvider,
};
use crate::key::{Annotation, BindingAnnotation, Key, RawKey};
use std::borrow::Cow;
use std::marker::PhantomData;

fn element_mut<'a>(binder: &'a mut Binder, index: usize) -> &'a mut BindingElement {
    match &mut binder.elements[index] {
        Element::Binding(binding) => binding,
        _ => unreachable!("binding builder refers to a binding element"),
    }
}

/// First stage of a binding: may pick an annotation before linking.
pub struct AnnotatedBindingBuilder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    index: usize,
    _marker: PhantomData<fn(&T)>,
}

impl<'a, T: ?Sized + Injectable> AnnotatedBindingBuilder<'a, T> {
    pub(crate) fn new(binder: &'a mut Binder, index: usize) -> Self {
        Self {
            binder,
            index,
            _marker: PhantomData,
        }
    }

    /// Binds under the annotation given as a marker type.
    pub fn annotated_with<A: BindingAnnotation>(self) -> LinkedBindingBuilder<'a, T> {
        self.annotate(Annotation::of_type::<A>())
    }

    /// Binds under a textual qualifier.
    pub fn named(self, name: impl Into<Cow<'static, str>>) -> LinkedBindingBuilder<'a, T> {
        self.annotate(Annotation::named(name))
    }

    fn annotate(self, annotation: Annotation) -> LinkedBindingBuilder<'a, T> {
        let element = element_mut(self.binder, self.index);
        element.key = element.key.clone().with_annotation(annotation);
        LinkedBindingBuilder::new(self.binder, self.index)
    }

    /// See [LinkedBindingBuilder::to].
    pub fn to<U: Inject + Upcast<T>>(self) -> ScopedBindingBuilder<'a> {
        LinkedBindingBuilder::new(self.binder, self.index).to::<U>()
    }

    /// See [LinkedBindingBuilder::to_key].
    pub fn to_key(self, key: Key<T>) -> ScopedBindingBuilder<'a> {
        LinkedBindingBuilder::new(self.binder, self.index).to_key(key)
    }

    /// See [LinkedBindingBuilder::to_instance].
    pub fn to_instance(self, instance: impl Into<InstancePtr<T>>) {
        LinkedBindingBuilder::new(self.binder, self.index).to_instance(instance)
    }

    /// See [LinkedBindingBuilder::to_provider].
    pub fn to_provider<P: Inject + TypedProvider<T>>(self) -> ScopedBindingBuilder<'a> {
        LinkedBindingBuilder::new(self.binder, self.index).to_provider::<P>()
    }

    /// See [LinkedBindingBuilder::to_provider_fn].
    pub fn to_provider_fn<F>(self, provider: F) -> ScopedBindingBuilder<'a>
    where
        F: Fn(&mut dyn InstanceProvider) -> Result<InstancePtr<T>, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        LinkedBindingBuilder::new(self.binder, self.index).to_provider_fn(provider)
    }
}

impl<'a, T: Inject> AnnotatedBindingBuilder<'a, T> {
    /// See [LinkedBindingBuilder::to_self].
    pub fn to_self(self) -> ScopedBindingBuilder<'a> {
        LinkedBindingBuilder::<T>::new(self.binder, self.index).to_self()
    }
}

/// Second stage of a binding: links the key to a target.
pub struct LinkedBindingBuilder<'a, T: ?Sized> {
    binder: &'a mut Binder,
    index: usize,
    _marker: PhantomData<fn(&T)>,
}

impl<'a, T: ?Sized + Injectable> LinkedBindingBuilder<'a, T> {
    pub(crate) fn new(binder: &'a mut Binder, index: usize) -> Self {
        Self {
            binder,
            index,
            _marker: PhantomData,
        }
    }

    /// Links to the implementation `U`. When `U` has an explicit binding it
    /// is resolved through it; otherwise `U` is constructed on demand via
    /// [Inject].
    pub fn to<U: Inject + Upcast<T>>(self) -> ScopedBindingBuilder<'a> {
        let target_key = RawKey::of::<U>();
        let resolved_key = target_key.clone();
        let ctor = constructor(move |ctx| {
            let instance: InstancePtr<U> = if ctx.has_binding(&resolved_key) {
                let handle = ctx.instance_for_key(&resolved_key)?;
                unwrap_instance::<U>(&handle, &resolved_key)?
            } else {
                ctx.construct_unbound(&resolved_key, |provider| {
                    U::create(provider).map(InstancePtr::new)
                })?
            };
            Ok(wrap_instance(<U as Upcast<T>>::upcast(instance)))
        });

        self.set_target(ctor, TargetId::Linked(target_key))
    }

    /// Links to another key of the same type, typically one carrying a
    /// different annotation.
    pub fn to_key(self, key: Key<T>) -> ScopedBindingBuilder<'a> {
        let target_key = key.into_raw();
        let resolved_key = target_key.clone();
        let ctor = constructor(move |ctx| ctx.instance_for_key(&resolved_key));

        self.set_target(ctor, TargetId::Linked(target_key))
    }

    /// Binds to an existing instance.
    pub fn to_instance(self, instance: impl Into<InstancePtr<T>>) {
        let handle = wrap_instance(instance.into());
        let stored = handle.clone();
        let ctor = constructor(move |_| Ok(stored.clone()));

        self.set_target(ctor, TargetId::Instance(handle));
    }

    /// Binds through the provider type `P`, constructed via [Inject] and then
    /// asked for instances on every lookup.
    pub fn to_provider<P: Inject + TypedProvider<T>>(self) -> ScopedBindingBuilder<'a> {
        let provider_key = RawKey::of::<P>();
        let resolved_key = provider_key.clone();
        let ctor = constructor(move |ctx| {
            let provider: InstancePtr<P> = if ctx.has_binding(&resolved_key) {
                let handle = ctx.instance_for_key(&resolved_key)?;
                unwrap_instance::<P>(&handle, &resolved_key)?
            } else {
                ctx.construct_unbound(&resolved_key, |inner| {
                    P::create(inner).map(InstancePtr::new)
                })?
            };
            provider.get(ctx).map(wrap_instance)
        });

        self.set_target(ctor, TargetId::Provider(provider_key))
    }

    /// Binds through a provider closure.
    pub fn to_provider_fn<F>(self, provider: F) -> ScopedBindingBuilder<'a>
    where
        F: Fn(&mut dyn InstanceProvider) -> Result<InstancePtr<T>, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        let ctor = constructor(move |ctx| provider(ctx).map(wrap_instance));
        self.set_target(ctor, TargetId::Opaque)
    }

    fn set_target(
        self,
        ctor: crate::element::ConstructorFn,
        target_id: TargetId,
    ) -> ScopedBindingBuilder<'a> {
        let element = element_mut(self.binder, self.index);
        element.target = Some((ctor, target_id));
        ScopedBindingBuilder {
            binder: self.binder,
            index: self.index,
        }
    }
}

impl<'a, T: Inject> LinkedBindingBuilder<'a, T> {
    /// Binds the key to its own type, constructed via [Inject]. This is how a
    /// concrete type is given a scope.
    pub fn to_self(self) -> ScopedBindingBuilder<'a> {
        let ctor = constructor(move |ctx| {
            T::create(ctx).map(|instance| wrap_instance(InstancePtr::new(instance)))
        });

        self.set_target(ctor, TargetId::Linked(RawKey::of::<T>()))
    }
}

/// Final stage of a binding: may place it into a scope.
pub struct ScopedBindingBuilder<'a> {
    binder: &'a mut Binder,
    index: usize,
}

impl ScopedBindingBuilder<'_> {
    /// Places the binding into the named scope, e.g.
    /// [SINGLETON](crate::scope::SINGLETON). Unscoped bindings construct a
    /// fresh instance on every lookup.
    pub fn in_scope(self, scope: impl Into<String>) {
        element_mut(self.binder, self.index).scope = Some(scope.into());
    }
}
