//! Lazy handles into an injector. A [Provider] can be obtained during
//! configuration, long before the injector exists; it becomes usable the
//! moment creation finishes. [MembersInjector] drives
//! [MembersInject](crate::inject::MembersInject) on demand.

use crate::error::ResolveError;
use crate::inject::{Injectable, MembersInject};
use crate::injector::InjectorCore;
use crate::instance_provider::{unwrap_instance, InstancePtr};
use crate::key::RawKey;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, Weak};

/// Reference to an injector that may not have been created yet. Filled in
/// once at the end of injector creation.
pub(crate) type SharedCore = Arc<OnceLock<Weak<InjectorCore>>>;

/// Environment index assigned to a binder once its elements are processed.
pub(crate) type EnvHandle = Arc<OnceLock<usize>>;

pub(crate) fn ready_env(env: usize) -> EnvHandle {
    let handle = OnceLock::new();
    let _ = handle.set(env);
    Arc::new(handle)
}

/// Key-erased form of [Provider].
#[derive(Clone)]
pub struct RawProvider {
    core: SharedCore,
    env: EnvHandle,
    key: RawKey,
}

impl RawProvider {
    pub(crate) fn new(core: SharedCore, env: EnvHandle, key: RawKey) -> Self {
        Self { core, env, key }
    }

    /// A handle that is not connected to any injector and always fails with
    /// [ResolveError::InjectorUnavailable]. Useful for foreign
    /// [InstanceProvider](crate::instance_provider::InstanceProvider)
    /// implementations.
    pub fn disconnected(key: RawKey) -> Self {
        Self {
            core: SharedCore::default(),
            env: EnvHandle::default(),
            key,
        }
    }

    pub fn key(&self) -> &RawKey {
        &self.key
    }

    pub fn typed<T: ?Sized + Injectable>(self) -> Provider<T> {
        Provider {
            raw: self,
            _marker: PhantomData,
        }
    }

    fn resolve(&self) -> Result<crate::instance_provider::InstanceHandle, ResolveError> {
        let core = self
            .core
            .get()
            .and_then(Weak::upgrade)
            .ok_or(ResolveError::InjectorUnavailable)?;
        let env = *self.env.get().ok_or(ResolveError::InjectorUnavailable)?;
        core.resolve_entry(env, &self.key)
    }
}

impl fmt::Debug for RawProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawProvider({})", self.key)
    }
}

/// Lazily resolves instances of `T` from the injector it was created for.
///
/// A provider must not be used from within [Inject::create](crate::inject::Inject::create)
/// of the same injector; constructors resolve their dependencies through the
/// [InstanceProvider](crate::instance_provider::InstanceProvider) passed to
/// them instead.
pub struct Provider<T: ?Sized> {
    raw: RawProvider,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Injectable> Provider<T> {
    pub fn get(&self) -> Result<InstancePtr<T>, ResolveError> {
        let handle = self.raw.resolve()?;
        unwrap_instance(&handle, &self.raw.key)
    }

    pub fn key(&self) -> &RawKey {
        &self.raw.key
    }
}

impl<T: ?Sized> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provider({})", self.raw.key)
    }
}

/// Injects dependencies into already constructed values of `T`.
pub struct MembersInjector<T: ?Sized> {
    core: SharedCore,
    env: EnvHandle,
    _marker: PhantomData<fn(&T)>,
}

impl<T: MembersInject> MembersInjector<T> {
    pub(crate) fn new(core: SharedCore, env: EnvHandle) -> Self {
        Self {
            core,
            env,
            _marker: PhantomData,
        }
    }

    pub fn inject_into(&self, target: &mut T) -> Result<(), ResolveError> {
        let core = self
            .core
            .get()
            .and_then(Weak::upgrade)
            .ok_or(ResolveError::InjectorUnavailable)?;
        let env = *self.env.get().ok_or(ResolveError::InjectorUnavailable)?;
        core.with_provider(env, |provider| target.inject_members(provider))
    }
}

impl<T: ?Sized> fmt::Debug for MembersInjector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MembersInjector<{}>", std::any::type_name::<T>())
    }
}
