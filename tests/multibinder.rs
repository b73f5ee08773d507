mod common;

use bindery::binder::Binder;
use bindery::error::CreationError;
use bindery::injector::Injector;
use bindery::multibindings::{
    new_annotated_set_binder, new_named_set_binder, new_set_binder, provider_set_key, set_key,
};
use common::{AImpl, Annotated, A, B};

#[test]
fn elements_union_across_modules_in_order() {
    let first = |binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>();
    };
    let second = |binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<B>();
    };

    let injector = Injector::builder()
        .with_module(first)
        .with_module(second)
        .build()
        .unwrap();

    let elements = injector.set_of::<dyn A>().unwrap();
    let rendered: Vec<String> = elements.iter().map(|element| element.get()).collect();
    assert_eq!(rendered, vec!["Impl of A", "This is B"]);
}

#[test]
fn the_collection_is_available_under_its_derived_key() {
    let injector = Injector::create(|binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>();
    })
    .unwrap();

    let elements = injector.instance_of(&set_key::<dyn A>()).unwrap();
    assert_eq!(elements.len(), 1);
}

#[test]
fn an_empty_set_binder_yields_an_empty_collection() {
    let injector = Injector::create(|binder: &mut Binder| {
        new_set_binder::<dyn A>(binder);
    })
    .unwrap();

    assert!(injector.set_of::<dyn A>().unwrap().is_empty());
}

#[test]
fn annotated_and_named_sets_are_separate_collections() {
    let injector = Injector::create(|binder: &mut Binder| {
        let mut plain = new_set_binder::<dyn A>(binder);
        plain.add_binding().to::<AImpl>();

        let mut annotated = new_annotated_set_binder::<dyn A, Annotated>(binder);
        annotated.add_binding().to::<B>();

        let mut named = new_named_set_binder::<dyn A>(binder, "extra");
        named.add_binding().to::<B>();
        named.add_binding().to::<AImpl>();
    })
    .unwrap();

    assert_eq!(injector.set_of::<dyn A>().unwrap().len(), 1);

    let annotated = injector
        .instance_of(&bindery::multibindings::set_key_for(
            &bindery::key::annotated_key::<dyn A, Annotated>(),
        ))
        .unwrap();
    assert_eq!(annotated.len(), 1);

    let named = injector
        .instance_of(&bindery::multibindings::set_key_for(
            &bindery::key::named_key::<dyn A>("extra"),
        ))
        .unwrap();
    assert_eq!(named.len(), 2);
}

#[test]
fn duplicate_elements_fail_at_creation() {
    let first = |binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>();
    };
    let second = |binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>();
    };

    let result = Injector::builder()
        .with_module(first)
        .with_module(second)
        .build();

    assert!(matches!(
        result.unwrap_err(),
        CreationError::DuplicateSetElement { .. }
    ));
}

#[test]
fn permit_duplicates_allows_repeated_elements() {
    let first = |binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.permit_duplicates();
        set.add_binding().to::<AImpl>();
    };
    let second = |binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>();
    };

    let injector = Injector::builder()
        .with_module(first)
        .with_module(second)
        .build()
        .unwrap();

    assert_eq!(injector.set_of::<dyn A>().unwrap().len(), 2);
}

#[test]
fn provider_wrapped_elements_resolve_lazily() {
    let injector = Injector::create(|binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>();
        set.add_binding().to::<B>();
    })
    .unwrap();

    let providers = injector.instance_of(&provider_set_key::<dyn A>()).unwrap();
    assert_eq!(providers.len(), 2);

    let rendered: Vec<String> = providers
        .iter()
        .map(|provider| provider.get().unwrap().get())
        .collect();
    assert_eq!(rendered, vec!["Impl of A", "This is B"]);
}

#[test]
fn scoped_elements_keep_their_scope() {
    use bindery::instance_provider::InstancePtr;
    use bindery::scope::SINGLETON;

    let injector = Injector::create(|binder: &mut Binder| {
        let mut set = new_set_binder::<dyn A>(binder);
        set.add_binding().to::<AImpl>().in_scope(SINGLETON);
    })
    .unwrap();

    let first = injector.set_of::<dyn A>().unwrap();
    let second = injector.set_of::<dyn A>().unwrap();
    assert!(InstancePtr::ptr_eq(&first[0], &second[0]));
}
