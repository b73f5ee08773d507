//! Instances are reused or recreated according to [Scope]s. A scope decides,
//! per binding slot, whether a stored instance is handed back or a new one is
//! constructed. The built-in [SINGLETON] scope caches forever, [PROTOTYPE]
//! never caches, and unscoped bindings skip scope handling entirely. Custom
//! scopes are registered under a name with
//! [bind_scope](crate::binder::Binder::bind_scope).
//!
//! Note: scope resolution happens at instance creation time, so mixing
//! incompatible scopes has the usual consequence that a singleton holding a
//! prototype dependency keeps that one prototype instance alive for as long
//! as the singleton lives.

use crate::instance_provider::InstanceHandle;
use crate::key::RawKey;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;

pub type ScopePtr = Box<dyn Scope + Send + Sync>;

pub type ScopeFactoryPtr = Box<dyn ScopeFactory + Send + Sync>;

/// Name of the built-in singleton scope.
pub const SINGLETON: &str = "SINGLETON";

/// Name of the built-in prototype scope.
pub const PROTOTYPE: &str = "PROTOTYPE";

/// Identifies one binding slot: a key inside one binding environment.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BindingSlot {
    pub env: usize,
    pub key: RawKey,
}

/// A container of instances. See the module documentation.
#[cfg_attr(test, automock)]
pub trait Scope {
    /// Gets the instance stored for the given slot, if this scope has one.
    fn instance(&self, slot: &BindingSlot) -> Option<InstanceHandle>;

    /// Stores an instance for the given slot. A scope may ignore the call.
    fn store_instance(&mut self, slot: &BindingSlot, instance: InstanceHandle);
}

/// Scope for instances shared between all lookups of a slot.
#[derive(Default)]
pub struct SingletonScope {
    instances: FxHashMap<BindingSlot, InstanceHandle>,
}

impl Scope for SingletonScope {
    #[inline]
    fn instance(&self, slot: &BindingSlot) -> Option<InstanceHandle> {
        self.instances.get(slot).cloned()
    }

    #[inline]
    fn store_instance(&mut self, slot: &BindingSlot, instance: InstanceHandle) {
        self.instances.insert(slot.clone(), instance);
    }
}

/// A scope which hands out a new instance on every request.
#[derive(Default, Copy, Clone, Eq, PartialEq)]
pub struct PrototypeScope;

impl Scope for PrototypeScope {
    #[inline]
    fn instance(&self, _slot: &BindingSlot) -> Option<InstanceHandle> {
        None
    }

    #[inline]
    fn store_instance(&mut self, _slot: &BindingSlot, _instance: InstanceHandle) {}
}

/// Factory for [Scope]s, invoked once per injector when the scope is first
/// used.
#[cfg_attr(test, automock)]
pub trait ScopeFactory {
    fn create_scope(&self) -> ScopePtr;
}

#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct SingletonScopeFactory;

impl ScopeFactory for SingletonScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<SingletonScope>::default()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct PrototypeScopeFactory;

impl ScopeFactory for PrototypeScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<PrototypeScope>::default()
    }
}
