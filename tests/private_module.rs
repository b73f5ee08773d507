mod common;

use bindery::binder::{Binder, PrivateBinder};
use bindery::error::{CreationError, ResolveError};
use bindery::injector::Injector;
use bindery::instance_provider::InstancePtr;
use common::{AContainer, AImpl, A, B};

#[test]
fn exposed_bindings_are_visible_outside() {
    let injector = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<dyn A>().to::<AImpl>();
            binder.bind::<AContainer>().to_self();
            binder.expose::<AContainer>();
        })
        .build()
        .unwrap();

    let container = injector.instance::<AContainer>().unwrap();
    assert_eq!(container.a.get(), "Impl of A");
}

#[test]
fn unexposed_bindings_stay_private() {
    let injector = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<dyn A>().to::<AImpl>();
            binder.bind::<AContainer>().to_self();
            binder.expose::<AContainer>();
        })
        .build()
        .unwrap();

    assert!(matches!(
        injector.instance::<dyn A>().unwrap_err(),
        ResolveError::NoBinding(_)
    ));
}

#[test]
fn private_modules_may_duplicate_each_others_hidden_bindings() {
    let injector = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<dyn A>().to::<AImpl>();
            binder.bind::<String>().to_provider_fn(|provider| {
                use bindery::instance_provider::TypedInstanceProvider;
                Ok(InstancePtr::new(provider.instance::<dyn A>()?.get()))
            });
            binder.expose::<String>();
        })
        .with_module(|binder: &mut Binder| {
            binder.bind::<dyn A>().to::<B>();
        })
        .build()
        .unwrap();

    // the private environment sees its own dyn A, the root sees its own
    assert_eq!(*injector.instance::<String>().unwrap(), "Impl of A");
    assert_eq!(injector.instance::<dyn A>().unwrap().get(), "This is B");
}

#[test]
fn private_bindings_see_the_parent_environment() {
    let injector = Injector::builder()
        .with_module(|binder: &mut Binder| {
            binder.bind::<dyn A>().to::<AImpl>();
        })
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<AContainer>().to_self();
            binder.expose::<AContainer>();
        })
        .build()
        .unwrap();

    let container = injector.instance::<AContainer>().unwrap();
    assert_eq!(container.a.get(), "Impl of A");
}

#[test]
fn exposing_an_unbound_key_fails_at_creation() {
    let result = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.expose::<dyn A>();
        })
        .build();

    assert!(matches!(
        result.unwrap_err(),
        CreationError::ExposedButUnbound { .. }
    ));
}

#[test]
fn an_exposed_key_conflicts_with_a_root_binding() {
    let result = Injector::builder()
        .with_module(|binder: &mut Binder| {
            binder.bind::<dyn A>().to::<B>();
        })
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<dyn A>().to::<AImpl>();
            binder.expose::<dyn A>();
        })
        .build();

    assert!(matches!(
        result.unwrap_err(),
        CreationError::DuplicateBinding { .. }
    ));
}

#[test]
fn exposed_named_keys_are_refined() {
    let injector = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<dyn A>().named("inner").to::<AImpl>();
            binder.expose::<dyn A>().named("inner");
        })
        .build()
        .unwrap();

    assert_eq!(
        injector.named_instance::<dyn A>("inner").unwrap().get(),
        "Impl of A"
    );
}

#[test]
fn nested_private_modules_chain_their_environments() {
    let injector = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.install_private(|inner: &mut PrivateBinder| {
                inner.bind::<dyn A>().to::<AImpl>();
                inner.expose::<dyn A>();
            });
            binder.bind::<AContainer>().to_self();
            binder.expose::<AContainer>();
        })
        .build()
        .unwrap();

    let container = injector.instance::<AContainer>().unwrap();
    assert_eq!(container.a.get(), "Impl of A");
}

#[test]
fn private_singletons_are_shared_through_exposure() {
    use bindery::scope::SINGLETON;

    let injector = Injector::builder()
        .with_private_module(|binder: &mut PrivateBinder| {
            binder.bind::<AImpl>().to_self().in_scope(SINGLETON);
            binder.expose::<AImpl>();
        })
        .build()
        .unwrap();

    let first = injector.instance::<AImpl>().unwrap();
    let second = injector.instance::<AImpl>().unwrap();
    assert!(InstancePtr::ptr_eq(&first, &second));
}
