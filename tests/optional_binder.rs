mod common;

use bindery::binder::Binder;
use bindery::error::{CreationError, ResolveError};
use bindery::injector::Injector;
use bindery::multibindings::{
    new_named_optional_binder, new_optional_binder, optional_key, optional_key_for,
    optional_provider_key,
};
use common::{AImpl, A, B};

#[test]
fn an_empty_optional_binder_resolves_to_none() {
    let injector = Injector::create(|binder: &mut Binder| {
        new_optional_binder::<dyn A>(binder);
    })
    .unwrap();

    assert!(matches!(
        injector.instance::<dyn A>().unwrap_err(),
        ResolveError::NoBinding(_)
    ));
    assert!(injector.instance_of(&optional_key::<dyn A>()).unwrap().is_none());
    assert!(injector
        .instance_of(&optional_provider_key::<dyn A>())
        .unwrap()
        .is_none());
}

#[test]
fn a_default_fills_the_slot() {
    let injector = Injector::create(|binder: &mut Binder| {
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_default().to::<AImpl>();
    })
    .unwrap();

    assert_eq!(injector.instance::<dyn A>().unwrap().get(), "Impl of A");

    let option = injector.instance_of(&optional_key::<dyn A>()).unwrap();
    assert_eq!(option.as_ref().unwrap().get(), "Impl of A");
}

#[test]
fn the_actual_binding_overrides_the_default() {
    let defaults = |binder: &mut Binder| {
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_default().to::<AImpl>();
    };
    let actual = |binder: &mut Binder| {
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_binding().to::<B>();
    };

    let injector = Injector::builder()
        .with_module(defaults)
        .with_module(actual)
        .build()
        .unwrap();

    assert_eq!(injector.instance::<dyn A>().unwrap().get(), "This is B");
}

#[test]
fn two_defaults_collide_at_creation() {
    let first = |binder: &mut Binder| {
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_default().to::<AImpl>();
    };
    let second = |binder: &mut Binder| {
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_default().to::<B>();
    };

    let result = Injector::builder()
        .with_module(first)
        .with_module(second)
        .build();

    assert!(matches!(
        result.unwrap_err(),
        CreationError::DuplicateBinding { .. }
    ));
}

#[test]
fn an_optional_binder_conflicts_with_a_direct_binding() {
    let result = Injector::create(|binder: &mut Binder| {
        binder.bind::<dyn A>().to::<AImpl>();
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_default().to::<B>();
    });

    assert!(matches!(
        result.unwrap_err(),
        CreationError::DuplicateBinding { .. }
    ));
}

#[test]
fn the_provider_slot_resolves_the_effective_binding() {
    let injector = Injector::create(|binder: &mut Binder| {
        let mut optional = new_optional_binder::<dyn A>(binder);
        optional.set_default().to::<AImpl>();
        optional.set_binding().to::<B>();
    })
    .unwrap();

    let provider = injector
        .instance_of(&optional_provider_key::<dyn A>())
        .unwrap();
    assert_eq!(
        provider.as_ref().unwrap().get().unwrap().get(),
        "This is B"
    );
}

#[test]
fn named_optional_slots_are_separate() {
    let injector = Injector::create(|binder: &mut Binder| {
        let mut plain = new_optional_binder::<dyn A>(binder);
        plain.set_default().to::<AImpl>();

        let mut named = new_named_optional_binder::<dyn A>(binder, "backup");
        named.set_default().to::<B>();
    })
    .unwrap();

    assert_eq!(injector.instance::<dyn A>().unwrap().get(), "Impl of A");
    assert_eq!(
        injector.named_instance::<dyn A>("backup").unwrap().get(),
        "This is B"
    );

    let named_option = injector
        .instance_of(&optional_key_for(&bindery::key::named_key::<dyn A>(
            "backup",
        )))
        .unwrap();
    assert_eq!(named_option.as_ref().unwrap().get(), "This is B");
}
