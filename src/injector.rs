//! Injector creation and instance resolution. [InjectorBuilder] runs every
//! module, interprets the recorded elements into binding environments, and
//! validates the whole configuration before any instance exists; every
//! configuration mistake is a [CreationError] here rather than a lookup-time
//! surprise. The built [Injector] resolves instances by walking the
//! environment chain, applying scopes, and guarding against dependency
//! cycles.

use crate::binder::Binder;
use crate::element::{
    constructor, ConstructorFn, Element, MapBinderElement, MapEntryRecord, OptionalBinderElement,
    SetBinderElement, StaticInjectionFn, TargetId,
};
use crate::error::{CreationError, ResolveError, Source};
use crate::inject::{Injectable, MembersInject};
use crate::instance_provider::{
    unwrap_instance, InstanceHandle, InstancePtr, InstanceProvider,
};
use crate::key::{BindingAnnotation, Key, RawKey};
use crate::module::{Module, PrivateModule};
use crate::multibindings::{map_key, set_key, MapKey};
use crate::provider::{ready_env, MembersInjector, Provider, RawProvider, SharedCore};
use crate::registry::{BindingDefinition, BindingRegistry};
use crate::scope::{
    BindingSlot, PrototypeScopeFactory, ScopeFactoryPtr, ScopePtr, SingletonScopeFactory,
    PROTOTYPE, SINGLETON,
};
use fxhash::{FxHashMap, FxHashSet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

const ROOT_ENV: usize = 0;

/// One binding environment: the root injector or a private module.
pub(crate) struct Environment {
    registry: BindingRegistry,
    parent: Option<usize>,
}

pub(crate) struct InjectorCore {
    envs: Vec<Environment>,
    scope_factories: FxHashMap<String, ScopeFactoryPtr>,
    state: Mutex<ResolutionState>,
    pub(crate) shared: SharedCore,
}

#[derive(Default)]
struct ResolutionState {
    scopes: FxHashMap<String, ScopePtr>,
    under_construction: FxHashSet<BindingSlot>,
}

impl InjectorCore {
    fn lock_state(&self) -> MutexGuard<'_, ResolutionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn resolve_entry(
        &self,
        env: usize,
        key: &RawKey,
    ) -> Result<InstanceHandle, ResolveError> {
        let mut state = self.lock_state();
        let mut ctx = ResolveContext {
            core: self,
            state: &mut state,
            env,
        };
        ctx.instance_in_env(env, key)
    }

    pub(crate) fn with_provider<R>(
        &self,
        env: usize,
        f: impl FnOnce(&mut dyn InstanceProvider) -> R,
    ) -> R {
        let mut state = self.lock_state();
        let mut ctx = ResolveContext {
            core: self,
            state: &mut state,
            env,
        };
        f(&mut ctx)
    }
}

/// Resolution context threaded through every constructor. Tracks the current
/// environment and the slots under construction.
pub struct ResolveContext<'a> {
    core: &'a InjectorCore,
    state: &'a mut ResolutionState,
    env: usize,
}

impl ResolveContext<'_> {
    fn lookup(&self, from_env: usize, key: &RawKey) -> Option<(BindingDefinition, usize)> {
        let mut env = Some(from_env);
        while let Some(index) = env {
            let environment = &self.core.envs[index];
            if let Some(definition) = environment.registry.get(key) {
                return Some((definition.clone(), index));
            }
            env = environment.parent;
        }
        None
    }

    pub(crate) fn instance_in_env(
        &mut self,
        env: usize,
        key: &RawKey,
    ) -> Result<InstanceHandle, ResolveError> {
        let (definition, def_env) = self
            .lookup(env, key)
            .ok_or_else(|| ResolveError::NoBinding(key.clone()))?;
        self.construct(definition, def_env)
    }

    fn construct(
        &mut self,
        definition: BindingDefinition,
        def_env: usize,
    ) -> Result<InstanceHandle, ResolveError> {
        let slot = BindingSlot {
            env: def_env,
            key: definition.key.clone(),
        };

        if let Some(scope) = definition.scope.as_deref() {
            if let Some(instance) = self.scoped_instance(scope, &slot, &definition)? {
                return Ok(instance);
            }
        }

        if !self.state.under_construction.insert(slot.clone()) {
            return Err(ResolveError::DependencyCycle(definition.key.clone()));
        }
        trace!(key = %definition.key, "creating instance");

        let previous_env = self.env;
        self.env = def_env;
        let result = (definition.constructor)(self);
        self.env = previous_env;
        self.state.under_construction.remove(&slot);
        let instance = result?;

        if let Some(scope) = definition.scope.as_deref() {
            if let Some(scope) = self.state.scopes.get_mut(scope) {
                scope.store_instance(&slot, instance.clone());
            }
        }

        Ok(instance)
    }

    fn scoped_instance(
        &mut self,
        scope_name: &str,
        slot: &BindingSlot,
        definition: &BindingDefinition,
    ) -> Result<Option<InstanceHandle>, ResolveError> {
        if !self.state.scopes.contains_key(scope_name) {
            let factory = self.core.scope_factories.get(scope_name).ok_or_else(|| {
                ResolveError::UnrecognizedScope {
                    key: definition.key.clone(),
                    scope: scope_name.to_string(),
                }
            })?;
            self.state
                .scopes
                .insert(scope_name.to_string(), factory.create_scope());
        }

        Ok(self
            .state
            .scopes
            .get(scope_name)
            .and_then(|scope| scope.instance(slot)))
    }

    /// Runs a just-in-time construction for a key without an explicit
    /// binding, with the same cycle protection bound keys get.
    pub(crate) fn construct_unbound<R>(
        &mut self,
        key: &RawKey,
        f: impl FnOnce(&mut dyn InstanceProvider) -> Result<R, ResolveError>,
    ) -> Result<R, ResolveError> {
        let slot = BindingSlot {
            env: self.env,
            key: key.clone(),
        };
        if !self.state.under_construction.insert(slot.clone()) {
            return Err(ResolveError::DependencyCycle(key.clone()));
        }
        let result = f(self);
        self.state.under_construction.remove(&slot);
        result
    }
}

impl InstanceProvider for ResolveContext<'_> {
    fn instance_for_key(&mut self, key: &RawKey) -> Result<InstanceHandle, ResolveError> {
        self.instance_in_env(self.env, key)
    }

    fn has_binding(&mut self, key: &RawKey) -> bool {
        self.lookup(self.env, key).is_some()
    }

    fn provider_for_key(&mut self, key: &RawKey) -> RawProvider {
        RawProvider::new(self.core.shared.clone(), ready_env(self.env), key.clone())
    }
}

/// Collects modules and builds an [Injector].
#[derive(Default)]
pub struct InjectorBuilder {
    installs: Vec<Box<dyn FnOnce(&mut Binder)>>,
}

impl InjectorBuilder {
    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.installs
            .push(Box::new(move |binder| binder.install(module)));
        self
    }

    pub fn with_private_module(mut self, module: impl PrivateModule + 'static) -> Self {
        self.installs
            .push(Box::new(move |binder| binder.install_private(module)));
        self
    }

    pub fn build(self) -> Result<Injector, CreationError> {
        let shared = SharedCore::default();
        let mut binder = Binder::new(shared.clone(), ready_env(ROOT_ENV));
        for install in self.installs {
            install(&mut binder);
        }

        let mut build = BuildState {
            envs: vec![Environment {
                registry: BindingRegistry::default(),
                parent: None,
            }],
            scope_factories: [
                (
                    SINGLETON.to_string(),
                    Box::<SingletonScopeFactory>::default() as ScopeFactoryPtr,
                ),
                (
                    PROTOTYPE.to_string(),
                    Box::<PrototypeScopeFactory>::default() as ScopeFactoryPtr,
                ),
            ]
            .into_iter()
            .collect(),
            requires: Vec::new(),
            statics: Vec::new(),
        };
        build.process(binder.into_elements(), ROOT_ENV)?;
        build.validate()?;

        let bindings = build.envs.iter().map(|env| env.registry.len()).sum::<usize>();
        let environments = build.envs.len();

        let core = Arc::new(InjectorCore {
            envs: build.envs,
            scope_factories: build.scope_factories,
            state: Mutex::new(ResolutionState::default()),
            shared: shared.clone(),
        });
        let _ = shared.set(Arc::downgrade(&core));

        for (run, env, source) in build.statics {
            core.with_provider(env, |provider| run(provider))
                .map_err(|error| CreationError::StaticInjection { at: source, error })?;
        }

        debug!(bindings, environments, "injector created");
        Ok(Injector { core })
    }
}

struct BuildState {
    envs: Vec<Environment>,
    scope_factories: FxHashMap<String, ScopeFactoryPtr>,
    requires: Vec<(usize, RawKey, Source)>,
    statics: Vec<(StaticInjectionFn, usize, Source)>,
}

impl BuildState {
    fn process(&mut self, elements: Vec<Element>, env: usize) -> Result<(), CreationError> {
        let mut sets: Vec<(SetBinderElement, Vec<(RawKey, Source)>)> = Vec::new();
        let mut set_index: FxHashMap<RawKey, usize> = FxHashMap::default();
        let mut maps: Vec<(MapBinderElement, Vec<MapEntryRecord>)> = Vec::new();
        let mut map_index: FxHashMap<RawKey, usize> = FxHashMap::default();
        let mut optionals: Vec<OptionalBinderElement> = Vec::new();

        for element in elements {
            match element {
                Element::Binding(binding) => {
                    let Some((ctor, target_id)) = binding.target else {
                        return Err(CreationError::MissingImplementation {
                            key: binding.key,
                            at: binding.source,
                        });
                    };
                    self.envs[env].registry.try_register(BindingDefinition {
                        key: binding.key,
                        constructor: ctor,
                        target_id,
                        scope: binding.scope,
                        source: binding.source,
                    })?;
                }
                Element::ScopeBinding {
                    name,
                    factory,
                    source,
                } => {
                    if self.scope_factories.contains_key(&name) {
                        return Err(CreationError::DuplicateScope { scope: name, at: source });
                    }
                    self.scope_factories.insert(name, factory);
                }
                Element::RequireBinding { key, source } => {
                    self.requires.push((env, key, source));
                }
                Element::StaticInjection { run, source } => {
                    self.statics.push((run, env, source));
                }
                Element::SetBinder(set_binder) => {
                    set_index.insert(set_binder.set_key.clone(), sets.len());
                    sets.push((set_binder, Vec::new()));
                }
                Element::SetEntry {
                    set_key,
                    element_key,
                    source,
                } => {
                    // the owning set binder element always precedes its entries
                    if let Some(&index) = set_index.get(&set_key) {
                        sets[index].1.push((element_key, source));
                    }
                }
                Element::MapBinder(map_binder) => {
                    map_index.insert(map_binder.map_key.clone(), maps.len());
                    maps.push((map_binder, Vec::new()));
                }
                Element::MapEntry { map_key, record } => {
                    if let Some(&index) = map_index.get(&map_key) {
                        maps[index].1.push(record);
                    }
                }
                Element::OptionalBinder(optional) => optionals.push(optional),
                Element::PrivateEnvironment {
                    elements,
                    exposed,
                    env_handle,
                } => {
                    let child = self.envs.len();
                    self.envs.push(Environment {
                        registry: BindingRegistry::default(),
                        parent: Some(env),
                    });
                    let _ = env_handle.set(child);
                    self.process(elements, child)?;

                    for (key, source) in exposed {
                        if !self.envs[child].registry.is_registered(&key) {
                            return Err(CreationError::ExposedButUnbound { key, at: source });
                        }
                        let forwarded = key.clone();
                        self.envs[env].registry.try_register(BindingDefinition {
                            key,
                            constructor: constructor(move |ctx| {
                                ctx.instance_in_env(child, &forwarded)
                            }),
                            target_id: TargetId::Opaque,
                            scope: None,
                            source,
                        })?;
                    }
                }
            }
        }

        for (set_binder, entries) in sets {
            self.synthesize_set(env, set_binder, entries)?;
        }
        for (map_binder, records) in maps {
            self.synthesize_map(env, map_binder, records)?;
        }
        for optional in optionals {
            self.synthesize_optional(env, optional)?;
        }

        Ok(())
    }

    fn synthesize_set(
        &mut self,
        env: usize,
        set_binder: SetBinderElement,
        entries: Vec<(RawKey, Source)>,
    ) -> Result<(), CreationError> {
        if !set_binder.permit_duplicates {
            let mut seen = FxHashMap::default();
            for (element_key, source) in &entries {
                let Some(definition) = self.envs[env].registry.get(element_key) else {
                    continue;
                };
                let Some(token) = definition.target_id.dedup_token() else {
                    continue;
                };
                if let Some(&first) = seen.get(&token) {
                    return Err(CreationError::DuplicateSetElement {
                        set: set_binder.set_key.clone(),
                        element: definition.target_id.describe(),
                        first,
                        second: *source,
                    });
                }
                seen.insert(token, *source);
            }
        }

        let keys: Arc<Vec<RawKey>> =
            Arc::new(entries.into_iter().map(|(key, _)| key).collect());

        let assemble = set_binder.assemble_instances;
        let instance_keys = keys.clone();
        self.register_synthetic(
            env,
            set_binder.set_key,
            constructor(move |ctx| assemble(ctx, &instance_keys)),
            set_binder.source,
        )?;

        let assemble = set_binder.assemble_providers;
        self.register_synthetic(
            env,
            set_binder.provider_set_key,
            constructor(move |ctx| assemble(ctx, &keys)),
            set_binder.source,
        )
    }

    fn synthesize_map(
        &mut self,
        env: usize,
        map_binder: MapBinderElement,
        records: Vec<MapEntryRecord>,
    ) -> Result<(), CreationError> {
        if !map_binder.permit_duplicates {
            (map_binder.check_entries)(&map_binder.map_key, &records)?;
        }

        let records = Arc::new(records);

        let assemble = map_binder.assemble_map;
        let map_records = records.clone();
        self.register_synthetic(
            env,
            map_binder.map_key,
            constructor(move |ctx| assemble(ctx, &map_records)),
            map_binder.source,
        )?;

        let assemble = map_binder.assemble_provider_map;
        let provider_records = records.clone();
        self.register_synthetic(
            env,
            map_binder.provider_map_key,
            constructor(move |ctx| assemble(ctx, &provider_records)),
            map_binder.source,
        )?;

        let assemble = map_binder.assemble_entries;
        let entry_records = records.clone();
        self.register_synthetic(
            env,
            map_binder.entries_key,
            constructor(move |ctx| assemble(ctx, &entry_records)),
            map_binder.source,
        )?;

        if map_binder.permit_duplicates {
            let assemble = map_binder.assemble_multimap;
            self.register_synthetic(
                env,
                map_binder.multimap_key,
                constructor(move |ctx| assemble(ctx, &records)),
                map_binder.source,
            )?;
        }

        Ok(())
    }

    fn synthesize_optional(
        &mut self,
        env: usize,
        optional: OptionalBinderElement,
    ) -> Result<(), CreationError> {
        self.register_synthetic(env, optional.key, optional.bind_base, optional.source)?;
        self.register_synthetic(
            env,
            optional.option_key,
            optional.bind_option,
            optional.source,
        )?;
        self.register_synthetic(
            env,
            optional.option_provider_key,
            optional.bind_option_provider,
            optional.source,
        )
    }

    fn register_synthetic(
        &mut self,
        env: usize,
        key: RawKey,
        constructor: ConstructorFn,
        source: Source,
    ) -> Result<(), CreationError> {
        self.envs[env].registry.try_register(BindingDefinition {
            key,
            constructor,
            target_id: TargetId::Opaque,
            scope: None,
            source,
        })
    }

    fn validate(&self) -> Result<(), CreationError> {
        for (env, key, source) in &self.requires {
            if !self.is_resolvable(*env, key) {
                return Err(CreationError::MissingBinding {
                    key: key.clone(),
                    at: *source,
                });
            }
        }

        for env in &self.envs {
            for definition in env.registry.definitions() {
                if let Some(scope) = &definition.scope {
                    if !self.scope_factories.contains_key(scope) {
                        return Err(CreationError::UnknownScope {
                            key: definition.key.clone(),
                            scope: scope.clone(),
                            at: definition.source,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn is_resolvable(&self, env: usize, key: &RawKey) -> bool {
        let mut current = Some(env);
        while let Some(index) = current {
            if self.envs[index].registry.is_registered(key) {
                return true;
            }
            current = self.envs[index].parent;
        }
        false
    }
}

/// Resolves instances from the bindings configured by a set of modules.
pub struct Injector {
    core: Arc<InjectorCore>,
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector").finish_non_exhaustive()
    }
}

impl Injector {
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::default()
    }

    /// Builds an injector from a single module.
    pub fn create(module: impl Module + 'static) -> Result<Self, CreationError> {
        Self::builder().with_module(module).build()
    }

    pub fn instance<T: ?Sized + Injectable>(&self) -> Result<InstancePtr<T>, ResolveError> {
        self.instance_of(&Key::of())
    }

    pub fn named_instance<T: ?Sized + Injectable>(
        &self,
        name: &str,
    ) -> Result<InstancePtr<T>, ResolveError> {
        self.instance_of(&Key::named(name.to_owned()))
    }

    pub fn annotated_instance<T: ?Sized + Injectable, A: BindingAnnotation>(
        &self,
    ) -> Result<InstancePtr<T>, ResolveError> {
        self.instance_of(&Key::annotated::<A>())
    }

    pub fn instance_of<T: ?Sized + Injectable>(
        &self,
        key: &Key<T>,
    ) -> Result<InstancePtr<T>, ResolveError> {
        let handle = self.core.resolve_entry(ROOT_ENV, key.raw())?;
        unwrap_instance(&handle, key.raw())
    }

    pub fn provider<T: ?Sized + Injectable>(&self) -> Provider<T> {
        self.provider_for(Key::of())
    }

    pub fn provider_for<T: ?Sized + Injectable>(&self, key: Key<T>) -> Provider<T> {
        RawProvider::new(
            self.core.shared.clone(),
            ready_env(ROOT_ENV),
            key.into_raw(),
        )
        .typed()
    }

    pub fn members_injector<T: MembersInject>(&self) -> MembersInjector<T> {
        MembersInjector::new(self.core.shared.clone(), ready_env(ROOT_ENV))
    }

    /// Returns the elements contributed to the set binder for `T`.
    pub fn set_of<T: ?Sized + Injectable>(&self) -> Result<Vec<InstancePtr<T>>, ResolveError> {
        self.instance_of(&set_key::<T>()).map(|set| (*set).clone())
    }

    /// Returns the entries contributed to the map binder for `K` and `V`.
    pub fn map_of<K: MapKey, V: ?Sized + Injectable>(
        &self,
    ) -> Result<HashMap<K, InstancePtr<V>>, ResolveError> {
        self.instance_of(&map_key::<K, V>()).map(|map| (*map).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CreationError, ResolveError};
    use crate::inject::Inject;
    use crate::instance_provider::InstanceProvider;
    use crate::scope::{MockScope, ScopeFactory};

    struct Leaf;

    impl Inject for Leaf {
        fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
            Ok(Leaf)
        }
    }

    #[test]
    fn should_reject_untargeted_binding() {
        let result = Injector::create(|binder: &mut Binder| {
            binder.bind::<Leaf>();
        });

        assert!(matches!(
            result.unwrap_err(),
            CreationError::MissingImplementation { .. }
        ));
    }

    #[test]
    fn should_reject_unknown_scope() {
        let result = Injector::create(|binder: &mut Binder| {
            binder.bind::<Leaf>().to_self().in_scope("REQUEST");
        });

        assert!(matches!(
            result.unwrap_err(),
            CreationError::UnknownScope { .. }
        ));
    }

    #[test]
    fn should_reject_duplicate_scope_name() {
        let result = Injector::create(|binder: &mut Binder| {
            binder.bind_scope(SINGLETON, Box::<SingletonScopeFactory>::default());
        });

        assert!(matches!(
            result.unwrap_err(),
            CreationError::DuplicateScope { .. }
        ));
    }

    #[test]
    fn should_store_instance_in_custom_scope() {
        struct MockingScopeFactory;

        impl ScopeFactory for MockingScopeFactory {
            fn create_scope(&self) -> ScopePtr {
                let mut scope = MockScope::new();
                scope.expect_instance().return_const(None);
                scope.expect_store_instance().times(1).return_const(());
                Box::new(scope) as ScopePtr
            }
        }

        let injector = Injector::create(|binder: &mut Binder| {
            binder.bind_scope("REQUEST", Box::new(MockingScopeFactory));
            binder.bind::<Leaf>().to_self().in_scope("REQUEST");
        })
        .unwrap();

        injector.instance::<Leaf>().unwrap();
    }
}
