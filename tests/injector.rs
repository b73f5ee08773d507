mod common;

use bindery::binder::Binder;
use bindery::error::ResolveError;
use bindery::inject::Inject;
use bindery::injector::Injector;
use bindery::instance_provider::{
    InstanceHandle, InstancePtr, InstanceProvider, TypedInstanceProvider,
};
use bindery::key::named_key;
use bindery::scope::{
    BindingSlot, Scope, ScopeFactory, ScopePtr, PROTOTYPE, SINGLETON,
};
use common::{AImpl, A};
use fxhash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

static SINGLETON_CREATIONS: AtomicUsize = AtomicUsize::new(0);

struct CountedSingleton;

impl Inject for CountedSingleton {
    fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        SINGLETON_CREATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(CountedSingleton)
    }
}

#[test]
fn singletons_are_created_once() {
    let injector = Injector::create(|binder: &mut Binder| {
        binder.bind::<CountedSingleton>().to_self().in_scope(SINGLETON);
    })
    .unwrap();

    let first = injector.instance::<CountedSingleton>().unwrap();
    let second = injector.instance::<CountedSingleton>().unwrap();

    assert!(InstancePtr::ptr_eq(&first, &second));
    assert_eq!(SINGLETON_CREATIONS.load(Ordering::SeqCst), 1);
}

static PROTOTYPE_CREATIONS: AtomicUsize = AtomicUsize::new(0);

struct CountedPrototype;

impl Inject for CountedPrototype {
    fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        PROTOTYPE_CREATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(CountedPrototype)
    }
}

#[test]
fn prototypes_are_created_per_lookup() {
    let injector = Injector::create(|binder: &mut Binder| {
        binder.bind::<CountedPrototype>().to_self().in_scope(PROTOTYPE);
    })
    .unwrap();

    injector.instance::<CountedPrototype>().unwrap();
    injector.instance::<CountedPrototype>().unwrap();

    assert_eq!(PROTOTYPE_CREATIONS.load(Ordering::SeqCst), 2);
}

struct Ping {
    _pong: InstancePtr<Pong>,
}

struct Pong {
    _ping: InstancePtr<Ping>,
}

impl Inject for Ping {
    fn create(provider: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        Ok(Self {
            _pong: provider.instance::<Pong>()?,
        })
    }
}

impl Inject for Pong {
    fn create(provider: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        Ok(Self {
            _ping: provider.instance::<Ping>()?,
        })
    }
}

#[test]
fn dependency_cycles_are_detected() {
    let injector = Injector::create(|binder: &mut Binder| {
        binder.bind::<Ping>().to_self();
        binder.bind::<Pong>().to_self();
    })
    .unwrap();

    assert!(matches!(
        injector.instance::<Ping>().unwrap_err(),
        ResolveError::DependencyCycle(_)
    ));
}

#[test]
fn missing_bindings_fail_at_lookup() {
    let injector = Injector::create(|_: &mut Binder| {}).unwrap();

    assert!(matches!(
        injector.instance::<dyn A>().unwrap_err(),
        ResolveError::NoBinding(_)
    ));
}

#[test]
fn providers_resolve_lazily() {
    let injector = Injector::create(|binder: &mut Binder| {
        binder.bind::<dyn A>().to::<AImpl>();
    })
    .unwrap();

    let provider = injector.provider::<dyn A>();
    assert_eq!(provider.get().unwrap().get(), "Impl of A");

    let named = injector.provider_for(named_key::<dyn A>("missing"));
    assert!(matches!(
        named.get().unwrap_err(),
        ResolveError::NoBinding(_)
    ));
}

#[derive(Default)]
struct TestScope {
    instances: FxHashMap<BindingSlot, InstanceHandle>,
}

impl Scope for TestScope {
    fn instance(&self, slot: &BindingSlot) -> Option<InstanceHandle> {
        self.instances.get(slot).cloned()
    }

    fn store_instance(&mut self, slot: &BindingSlot, instance: InstanceHandle) {
        self.instances.insert(slot.clone(), instance);
    }
}

#[derive(Default)]
struct TestScopeFactory;

impl ScopeFactory for TestScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<TestScope>::default()
    }
}

#[test]
fn custom_scopes_control_reuse() {
    let injector = Injector::create(|binder: &mut Binder| {
        binder.bind_scope("TEST", Box::<TestScopeFactory>::default());
        binder.bind::<AImpl>().to_self().in_scope("TEST");
    })
    .unwrap();

    let first = injector.instance::<AImpl>().unwrap();
    let second = injector.instance::<AImpl>().unwrap();

    assert!(InstancePtr::ptr_eq(&first, &second));
}

#[test]
fn constructor_failures_are_reported() {
    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    struct Failing;

    impl Inject for Failing {
        fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
            Err(ResolveError::failure(Boom))
        }
    }

    let injector = Injector::create(|binder: &mut Binder| {
        binder.bind::<Failing>().to_self();
    })
    .unwrap();

    assert!(matches!(
        injector.instance::<Failing>().unwrap_err(),
        ResolveError::Failure(_)
    ));
}
