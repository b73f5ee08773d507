//! The binding registry interpreted by the injector. Definitions are
//! registered while elements are processed; duplicate keys are rejected
//! there and then, which is what turns configuration mistakes into
//! creation-time errors instead of lookup-time surprises.

use crate::element::{ConstructorFn, TargetId};
use crate::error::{CreationError, Source};
use crate::key::RawKey;
use derivative::Derivative;
use fxhash::FxHashMap;

/// A fully processed binding: key, constructor, scope, and provenance.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub(crate) struct BindingDefinition {
    pub key: RawKey,

    #[derivative(Debug = "ignore")]
    pub constructor: ConstructorFn,

    /// What the binding was linked to, used for duplicate-element detection.
    pub target_id: TargetId,

    /// Name of the scope the binding was placed in, or `None` for unscoped
    /// bindings that construct on every lookup.
    pub scope: Option<String>,

    pub source: Source,
}

/// Definitions of one binding environment, keyed by [RawKey].
#[derive(Default)]
pub(crate) struct BindingRegistry {
    definitions: FxHashMap<RawKey, BindingDefinition>,
}

impl BindingRegistry {
    pub(crate) fn try_register(&mut self, definition: BindingDefinition) -> Result<(), CreationError> {
        if let Some(existing) = self.definitions.get(&definition.key) {
            return Err(CreationError::DuplicateBinding {
                key: definition.key.clone(),
                first: existing.source,
                second: definition.source,
            });
        }

        self.definitions.insert(definition.key.clone(), definition);
        Ok(())
    }

    pub(crate) fn get(&self, key: &RawKey) -> Option<&BindingDefinition> {
        self.definitions.get(key)
    }

    #[inline]
    pub(crate) fn is_registered(&self, key: &RawKey) -> bool {
        self.definitions.contains_key(key)
    }

    pub(crate) fn definitions(&self) -> impl Iterator<Item = &BindingDefinition> {
        self.definitions.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::constructor;
    use crate::error::CreationError;
    use crate::instance_provider::wrap_instance;
    use crate::key::{Annotation, RawKey};
    use std::panic::Location;
    use std::sync::Arc;

    fn create_definition(key: RawKey) -> BindingDefinition {
        BindingDefinition {
            key,
            constructor: constructor(|_| Ok(wrap_instance(Arc::new(0i8)))),
            target_id: TargetId::Opaque,
            scope: None,
            source: Location::caller(),
        }
    }

    #[test]
    fn should_register_definition() {
        let key = RawKey::of::<i8>();

        let mut registry = BindingRegistry::default();
        registry.try_register(create_definition(key.clone())).unwrap();

        assert!(registry.is_registered(&key));
        assert!(registry.get(&key).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_not_register_duplicate_key() {
        let key = RawKey::of::<i8>();

        let mut registry = BindingRegistry::default();
        registry.try_register(create_definition(key.clone())).unwrap();

        assert!(matches!(
            registry.try_register(create_definition(key)).unwrap_err(),
            CreationError::DuplicateBinding { .. }
        ));
    }

    #[test]
    fn should_keep_annotated_keys_separate() {
        let plain = RawKey::of::<i8>();
        let named = RawKey::of::<i8>().with_annotation(Annotation::named("a"));

        let mut registry = BindingRegistry::default();
        registry.try_register(create_definition(plain.clone())).unwrap();
        registry.try_register(create_definition(named.clone())).unwrap();

        assert!(registry.is_registered(&plain));
        assert!(registry.is_registered(&named));
    }
}
