//! Configuration units. A [Module] groups related bindings and is installed
//! into a [Binder](crate::binder::Binder); a [PrivateModule] does the same
//! inside its own binding environment and chooses what to expose.

use crate::binder::{Binder, PrivateBinder};
use crate::key::RawKey;
use std::any::TypeId;

/// Identity under which repeated installs of a module collapse. Modules
/// without an identity are configured on every install.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ModuleIdentity {
    module_type: TypeId,
    key: Option<RawKey>,
}

impl ModuleIdentity {
    pub fn of<M: 'static>() -> Self {
        Self {
            module_type: TypeId::of::<M>(),
            key: None,
        }
    }

    /// Identity discriminated by a key, for modules that exist once per
    /// binding slot they configure.
    pub fn keyed<M: 'static>(key: RawKey) -> Self {
        Self {
            module_type: TypeId::of::<M>(),
            key: Some(key),
        }
    }
}

/// A unit of configuration. Implemented by hand or satisfied by any
/// `Fn(&mut Binder)` closure.
pub trait Module {
    fn configure(&self, binder: &mut Binder);

    /// Installing two modules with equal identity configures only the first.
    fn identity(&self) -> Option<ModuleIdentity> {
        None
    }
}

impl<F: Fn(&mut Binder)> Module for F {
    fn configure(&self, binder: &mut Binder) {
        self(binder)
    }
}

/// A module whose bindings live in a private environment, visible outside
/// only through [expose](crate::binder::PrivateBinder::expose).
pub trait PrivateModule {
    fn configure(&self, binder: &mut PrivateBinder);
}

impl<F: Fn(&mut PrivateBinder)> PrivateModule for F {
    fn configure(&self, binder: &mut PrivateBinder) {
        self(binder)
    }
}
