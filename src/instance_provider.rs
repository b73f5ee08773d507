//! Type-erased instance plumbing shared by the injector and the binding DSL.
//! Instances travel as [InstanceHandle]s, an `Arc<dyn Any>` wrapping the
//! typed `Arc<T>`, which keeps unsized bound types (trait objects) working
//! through the erased core.

use crate::error::ResolveError;
use crate::inject::Injectable;
use crate::key::{BindingAnnotation, Key, RawKey};
use crate::provider::{Provider, RawProvider};
use std::any::Any;
use std::sync::Arc;

/// Shared pointer to an instance managed by the injector.
pub type InstancePtr<T> = Arc<T>;

/// Type-erased instance, carrying an [InstancePtr] as its payload.
pub type InstanceHandle = Arc<dyn Any + Send + Sync>;

/// Erases a typed instance pointer.
pub fn wrap_instance<T: ?Sized + Injectable>(instance: InstancePtr<T>) -> InstanceHandle {
    Arc::new(instance)
}

/// Recovers a typed instance pointer from a handle. The key is only used for
/// the error message.
pub fn unwrap_instance<T: ?Sized + Injectable>(
    handle: &InstanceHandle,
    key: &RawKey,
) -> Result<InstancePtr<T>, ResolveError> {
    handle
        .downcast_ref::<InstancePtr<T>>()
        .cloned()
        .ok_or_else(|| ResolveError::IncompatibleInstance(key.clone()))
}

/// Key-erased access to instances. Implemented by the injector's resolution
/// context and passed to every constructor.
pub trait InstanceProvider {
    /// Resolves the binding for the given key.
    fn instance_for_key(&mut self, key: &RawKey) -> Result<InstanceHandle, ResolveError>;

    /// Checks whether an explicit binding for the key is visible from here.
    fn has_binding(&mut self, key: &RawKey) -> bool;

    /// Returns a lazy handle for the given key. The default implementation
    /// returns a disconnected handle and only the injector overrides it, so
    /// foreign implementations stay trivial.
    fn provider_for_key(&mut self, key: &RawKey) -> RawProvider {
        RawProvider::disconnected(key.clone())
    }
}

/// Strongly-typed helpers over [InstanceProvider], blanket implemented.
pub trait TypedInstanceProvider: InstanceProvider {
    /// Typesafe version of [InstanceProvider::instance_for_key].
    fn instance<T: ?Sized + Injectable>(&mut self) -> Result<InstancePtr<T>, ResolveError> {
        self.instance_of(&Key::<T>::of())
    }

    fn named_instance<T: ?Sized + Injectable>(
        &mut self,
        name: &str,
    ) -> Result<InstancePtr<T>, ResolveError> {
        self.instance_of(&Key::<T>::named(name.to_owned()))
    }

    fn annotated_instance<T: ?Sized + Injectable, A: BindingAnnotation>(
        &mut self,
    ) -> Result<InstancePtr<T>, ResolveError> {
        self.instance_of(&Key::<T>::annotated::<A>())
    }

    fn instance_of<T: ?Sized + Injectable>(
        &mut self,
        key: &Key<T>,
    ) -> Result<InstancePtr<T>, ResolveError> {
        let handle = self.instance_for_key(key.raw())?;
        unwrap_instance(&handle, key.raw())
    }

    /// Like [TypedInstanceProvider::instance], but turns a missing binding
    /// into `None` instead of an error.
    fn optional_instance<T: ?Sized + Injectable>(
        &mut self,
    ) -> Result<Option<InstancePtr<T>>, ResolveError> {
        match self.instance::<T>() {
            Ok(instance) => Ok(Some(instance)),
            Err(ResolveError::NoBinding(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Returns a lazy [Provider] for the given type.
    fn provider_of<T: ?Sized + Injectable>(&mut self) -> Provider<T> {
        self.provider_for_key(Key::<T>::of().raw()).typed()
    }
}

impl<P: InstanceProvider + ?Sized> TypedInstanceProvider for P {}
