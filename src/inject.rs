//! Traits implemented by injectable types. The central one is [Inject], which
//! gives a type a constructor that pulls its dependencies from an
//! [InstanceProvider](crate::instance_provider::InstanceProvider). [Upcast]
//! connects an implementation to the trait objects it can be bound to, and is
//! usually written with the [implements](crate::implements) macro:
//!
//! ```
//! use bindery::inject::Inject;
//! use bindery::instance_provider::InstanceProvider;
//! use bindery::error::ResolveError;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! impl Inject for EnglishGreeter {
//!     fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
//!         Ok(EnglishGreeter)
//!     }
//! }
//!
//! bindery::implements!(EnglishGreeter => dyn Greeter);
//! ```

use crate::error::ResolveError;
use crate::instance_provider::{InstancePtr, InstanceProvider};

/// Bound satisfied by every type usable as a binding key or instance. Blanket
/// implemented; user code never implements it directly.
pub trait Injectable: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Constructor injection. Types bound with
/// [to_self](crate::builder::LinkedBindingBuilder::to_self) or used as link
/// targets are created through this trait, resolving their dependencies from
/// the given provider.
pub trait Inject: Injectable + Sized {
    fn create(provider: &mut dyn InstanceProvider) -> Result<Self, ResolveError>;
}

/// Coercion from an implementation to a bound it was linked to. A reflexive
/// implementation exists for every sized type; implementations for trait
/// objects are one line each because the unsizing happens where both types
/// are concrete.
pub trait Upcast<T: ?Sized + Injectable>: Injectable + Sized {
    fn upcast(this: InstancePtr<Self>) -> InstancePtr<T>;
}

impl<T: Injectable> Upcast<T> for T {
    fn upcast(this: InstancePtr<Self>) -> InstancePtr<T> {
        this
    }
}

/// Declares which trait objects a concrete type can be bound to:
///
/// ```ignore
/// implements!(ServiceImpl => dyn Service, dyn Closeable);
/// ```
#[macro_export]
macro_rules! implements {
    ($impl_ty:ty => $($bound:ty),+ $(,)?) => {
        $(
            impl $crate::inject::Upcast<$bound> for $impl_ty {
                fn upcast(
                    this: $crate::instance_provider::InstancePtr<Self>,
                ) -> $crate::instance_provider::InstancePtr<$bound> {
                    this
                }
            }
        )+
    };
}

/// Implemented by provider types used with
/// [to_provider](crate::builder::LinkedBindingBuilder::to_provider). The
/// provider itself is constructed through [Inject] and then asked for
/// instances of the bound type.
pub trait TypedProvider<T: ?Sized + Injectable>: Injectable {
    fn get(&self, provider: &mut dyn InstanceProvider) -> Result<InstancePtr<T>, ResolveError>;
}

/// On-demand injection into an already constructed value, driven through a
/// [MembersInjector](crate::provider::MembersInjector) handle.
pub trait MembersInject: Injectable {
    fn inject_members(
        &mut self,
        provider: &mut dyn InstanceProvider,
    ) -> Result<(), ResolveError>;
}

/// Injection into process-wide state, requested with
/// [request_static_injection](crate::binder::Binder::request_static_injection)
/// and executed while the injector is created.
pub trait StaticInject: 'static {
    fn inject_static(provider: &mut dyn InstanceProvider) -> Result<(), ResolveError>;
}
