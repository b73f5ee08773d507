//! Strongly-typed binding DSL for dependency injection.
//!
//! Bindings are declared in [modules](module::Module) using generic type
//! parameters instead of reflective type tokens, and resolved through an
//! [Injector](injector::Injector):
//!
//! ```
//! use bindery::binder::Binder;
//! use bindery::error::ResolveError;
//! use bindery::inject::Inject;
//! use bindery::injector::Injector;
//! use bindery::instance_provider::InstanceProvider;
//! use bindery::scope::SINGLETON;
//!
//! trait Service: Send + Sync {
//!     fn answer(&self) -> i32;
//! }
//!
//! struct ServiceImpl;
//!
//! impl Service for ServiceImpl {
//!     fn answer(&self) -> i32 {
//!         42
//!     }
//! }
//!
//! impl Inject for ServiceImpl {
//!     fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
//!         Ok(ServiceImpl)
//!     }
//! }
//!
//! bindery::implements!(ServiceImpl => dyn Service);
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let injector = Injector::create(|binder: &mut Binder| {
//!     binder.bind::<dyn Service>().to::<ServiceImpl>().in_scope(SINGLETON);
//! })?;
//!
//! let service = injector.instance::<dyn Service>()?;
//! assert_eq!(service.answer(), 42);
//! # Ok(())
//! # }
//! ```
//!
//! Collections contributed to by several modules are configured through
//! [multibindings], private configuration through
//! [PrivateModule](module::PrivateModule), and instance reuse through named
//! [scopes](scope). All configuration mistakes, duplicate bindings included,
//! fail injector creation with a
//! [CreationError](error::CreationError) pointing at the module line that
//! caused them.

pub mod binder;
pub mod builder;
pub mod error;
pub mod inject;
pub mod injector;
pub mod instance_provider;
pub mod key;
pub mod module;
pub mod multibindings;
pub mod provider;
pub mod scope;

mod element;
mod registry;

pub use error::{CreationError, ResolveError};
pub use injector::Injector;
pub use key::{annotated_key, key, named_key, Key};
pub use module::{Module, PrivateModule};
