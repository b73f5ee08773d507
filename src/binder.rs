//! The binding DSL. A [Binder] records configuration while modules run and
//! hands the resulting elements to injector creation. Every entry point is
//! `#[track_caller]`, so configuration errors report the module line that
//! caused them rather than anything in this crate.
//!
//! ```
//! use bindery::binder::Binder;
//! use bindery::scope::SINGLETON;
//! # use bindery::inject::Inject;
//! # use bindery::instance_provider::InstanceProvider;
//! # use bindery::error::ResolveError;
//! # trait Service: Send + Sync {}
//! # struct ServiceImpl;
//! # impl Service for ServiceImpl {}
//! # impl Inject for ServiceImpl {
//! #     fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
//! #         Ok(ServiceImpl)
//! #     }
//! # }
//! # bindery::implements!(ServiceImpl => dyn Service);
//!
//! fn configure(binder: &mut Binder) {
//!     binder.bind::<dyn Service>().to::<ServiceImpl>().in_scope(SINGLETON);
//! }
//! ```

use crate::builder::{AnnotatedBindingBuilder, LinkedBindingBuilder};
use crate::element::{BindingElement, Element, StaticInjectionFn};
use crate::error::Source;
use crate::inject::{Injectable, MembersInject, StaticInject};
use crate::key::{Annotation, BindingAnnotation, Key, RawKey};
use crate::module::{Module, ModuleIdentity, PrivateModule};
use crate::provider::{EnvHandle, MembersInjector, Provider, RawProvider, SharedCore};
use crate::scope::ScopeFactoryPtr;
use fxhash::{FxHashMap, FxHashSet};
use std::any::type_name;
use std::borrow::Cow;
use std::panic::Location;
use tracing::debug;

/// Records bindings during module configuration.
pub struct Binder {
    pub(crate) elements: Vec<Element>,
    installed: FxHashSet<ModuleIdentity>,
    pub(crate) seen_set_binders: FxHashMap<RawKey, usize>,
    pub(crate) seen_map_binders: FxHashMap<RawKey, usize>,
    pub(crate) seen_optional_binders: FxHashSet<RawKey>,
    shared: SharedCore,
    env: EnvHandle,
}

impl Binder {
    pub(crate) fn new(shared: SharedCore, env: EnvHandle) -> Self {
        Self {
            elements: Vec::new(),
            installed: FxHashSet::default(),
            seen_set_binders: FxHashMap::default(),
            seen_map_binders: FxHashMap::default(),
            seen_optional_binders: FxHashSet::default(),
            shared,
            env,
        }
    }

    /// Starts a binding for `T`. The returned builder selects the annotation,
    /// the target, and the scope; a binding left without a target fails
    /// injector creation.
    #[track_caller]
    pub fn bind<T: ?Sized + Injectable>(&mut self) -> AnnotatedBindingBuilder<'_, T> {
        let index = self.push_binding(RawKey::of::<T>(), Location::caller());
        AnnotatedBindingBuilder::new(self, index)
    }

    /// Starts a binding for an explicit, possibly annotated key.
    #[track_caller]
    pub fn bind_key<T: ?Sized + Injectable>(&mut self, key: Key<T>) -> LinkedBindingBuilder<'_, T> {
        let index = self.push_binding(key.into_raw(), Location::caller());
        LinkedBindingBuilder::new(self, index)
    }

    /// Registers a scope factory under a name usable with
    /// [in_scope](crate::builder::ScopedBindingBuilder::in_scope).
    #[track_caller]
    pub fn bind_scope(&mut self, name: impl Into<String>, factory: ScopeFactoryPtr) {
        self.elements.push(Element::ScopeBinding {
            name: name.into(),
            factory,
            source: Location::caller(),
        });
    }

    /// Installs another module. Modules reporting an
    /// [identity](crate::module::Module::identity) install at most once.
    pub fn install<M: Module>(&mut self, module: M) {
        if let Some(identity) = module.identity() {
            if !self.installed.insert(identity) {
                debug!(module = type_name::<M>(), "skipping already installed module");
                return;
            }
        }

        debug!(module = type_name::<M>(), "installing module");
        module.configure(self);
    }

    /// Installs a module into its own private environment.
    pub fn install_private<M: PrivateModule>(&mut self, module: M) {
        debug!(module = type_name::<M>(), "installing private module");

        let mut private = PrivateBinder::new(Binder::new(self.shared.clone(), EnvHandle::default()));
        module.configure(&mut private);

        let PrivateBinder { binder, exposed } = private;
        self.elements.push(Element::PrivateEnvironment {
            elements: binder.elements,
            exposed,
            env_handle: binder.env,
        });
    }

    /// Requires an explicit binding for `T` to exist once the injector is
    /// created.
    #[track_caller]
    pub fn require_binding<T: ?Sized + Injectable>(&mut self) {
        self.elements.push(Element::RequireBinding {
            key: RawKey::of::<T>(),
            source: Location::caller(),
        });
    }

    /// Returns a lazy provider for `T`, usable once the injector exists.
    pub fn get_provider<T: ?Sized + Injectable>(&mut self) -> Provider<T> {
        self.get_provider_for(Key::of())
    }

    /// Returns a lazy provider for an explicit key.
    pub fn get_provider_for<T: ?Sized + Injectable>(&mut self, key: Key<T>) -> Provider<T> {
        RawProvider::new(self.shared.clone(), self.env.clone(), key.into_raw()).typed()
    }

    /// Schedules [StaticInject::inject_static] for `T` to run during injector
    /// creation.
    #[track_caller]
    pub fn request_static_injection<T: StaticInject>(&mut self) {
        let run: StaticInjectionFn = T::inject_static;
        self.elements.push(Element::StaticInjection {
            run,
            source: Location::caller(),
        });
    }

    /// Returns a handle injecting into existing values of `T`.
    pub fn get_members_injector<T: MembersInject>(&mut self) -> MembersInjector<T> {
        MembersInjector::new(self.shared.clone(), self.env.clone())
    }

    fn push_binding(&mut self, key: RawKey, source: Source) -> usize {
        self.push_element(Element::Binding(BindingElement {
            key,
            target: None,
            scope: None,
            source,
        }))
    }

    pub(crate) fn push_element(&mut self, element: Element) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub(crate) fn shared_core(&self) -> SharedCore {
        self.shared.clone()
    }

    pub(crate) fn env_handle(&self) -> EnvHandle {
        self.env.clone()
    }

    pub(crate) fn into_elements(self) -> Vec<Element> {
        self.elements
    }
}

/// Binder of a private module. Forwards the whole [Binder] surface into the
/// private environment and additionally exposes keys to the enclosing one.
pub struct PrivateBinder {
    pub(crate) binder: Binder,
    pub(crate) exposed: Vec<(RawKey, Source)>,
}

impl PrivateBinder {
    pub(crate) fn new(binder: Binder) -> Self {
        Self {
            binder,
            exposed: Vec::new(),
        }
    }

    /// Makes the binding for `T` visible to the enclosing environment.
    #[track_caller]
    pub fn expose<T: ?Sized + Injectable>(&mut self) -> ExposedKeyBuilder<'_> {
        self.exposed.push((RawKey::of::<T>(), Location::caller()));
        let index = self.exposed.len() - 1;
        ExposedKeyBuilder {
            exposed: &mut self.exposed,
            index,
        }
    }

    /// See [Binder::bind].
    #[track_caller]
    pub fn bind<T: ?Sized + Injectable>(&mut self) -> AnnotatedBindingBuilder<'_, T> {
        self.binder.bind()
    }

    /// See [Binder::bind_key].
    #[track_caller]
    pub fn bind_key<T: ?Sized + Injectable>(&mut self, key: Key<T>) -> LinkedBindingBuilder<'_, T> {
        self.binder.bind_key(key)
    }

    /// See [Binder::bind_scope].
    #[track_caller]
    pub fn bind_scope(&mut self, name: impl Into<String>, factory: ScopeFactoryPtr) {
        self.binder.bind_scope(name, factory);
    }

    /// See [Binder::install].
    pub fn install<M: Module>(&mut self, module: M) {
        self.binder.install(module);
    }

    /// See [Binder::install_private].
    pub fn install_private<M: PrivateModule>(&mut self, module: M) {
        self.binder.install_private(module);
    }

    /// See [Binder::require_binding].
    #[track_caller]
    pub fn require_binding<T: ?Sized + Injectable>(&mut self) {
        self.binder.require_binding::<T>();
    }

    /// See [Binder::get_provider].
    pub fn get_provider<T: ?Sized + Injectable>(&mut self) -> Provider<T> {
        self.binder.get_provider()
    }

    /// See [Binder::request_static_injection].
    #[track_caller]
    pub fn request_static_injection<T: StaticInject>(&mut self) {
        self.binder.request_static_injection::<T>();
    }

    /// See [Binder::get_members_injector].
    pub fn get_members_injector<T: MembersInject>(&mut self) -> MembersInjector<T> {
        self.binder.get_members_injector()
    }

    /// Direct access to the underlying private-environment binder.
    pub fn binder(&mut self) -> &mut Binder {
        &mut self.binder
    }
}

/// Refines which key of a private module is exposed.
pub struct ExposedKeyBuilder<'a> {
    exposed: &'a mut Vec<(RawKey, Source)>,
    index: usize,
}

impl ExposedKeyBuilder<'_> {
    pub fn annotated_with<A: BindingAnnotation>(self) -> Self {
        self.annotate(Annotation::of_type::<A>())
    }

    pub fn named(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.annotate(Annotation::named(name))
    }

    fn annotate(self, annotation: Annotation) -> Self {
        let (key, _) = self.exposed[self.index].clone();
        self.exposed[self.index].0 = key.with_annotation(annotation);
        self
    }
}
