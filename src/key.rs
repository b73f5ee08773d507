//! Binding keys. A [RawKey] is the (type, optional annotation) pair that
//! identifies one slot in the injector, with structural equality; [Key] is
//! its phantom-typed counterpart used throughout the binding DSL. Composite
//! slots (collections, maps, optionals) are identified by keys over ordinary
//! Rust composite types, derived with [Key::of_type] so the annotation of the
//! base key is preserved.

use crate::inject::Injectable;
use std::any::{type_name, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker trait for unit types used as binding annotations, the type-level
/// alternative to [Annotation::Named].
pub trait BindingAnnotation: 'static {}

/// Distinguishes several bindings of the same type from each other.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// A textual qualifier.
    Named(Cow<'static, str>),
    /// A [BindingAnnotation] marker type.
    Type { id: TypeId, name: &'static str },
    /// Synthetic annotation giving each multibinding element its own slot.
    Element { owner: &'static str, index: u64 },
    /// Synthetic annotation for derived slots with a fixed role, such as the
    /// default and actual slots of an optional binder. Structural, so
    /// independently derived keys compare equal.
    Role {
        role: BindingRole,
        base: Option<Box<Annotation>>,
    },
}

/// Roles for [Annotation::Role].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingRole {
    OptionalDefault,
    OptionalActual,
}

static ELEMENT_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Annotation {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    pub fn of_type<A: BindingAnnotation>() -> Self {
        Self::Type {
            id: TypeId::of::<A>(),
            name: type_name::<A>(),
        }
    }

    /// Returns a process-wide unique element annotation.
    pub(crate) fn element(owner: &'static str) -> Self {
        Self::Element {
            owner,
            index: ELEMENT_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn role(role: BindingRole, base: Option<Annotation>) -> Self {
        Self::Role {
            role,
            base: base.map(Box::new),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "@Named({name:?})"),
            Self::Type { name, .. } => write!(f, "@{name}"),
            Self::Element { owner, index } => write!(f, "@Element({owner}, {index})"),
            Self::Role { role, base } => {
                let role = match role {
                    BindingRole::OptionalDefault => "@Default",
                    BindingRole::OptionalActual => "@Actual",
                };
                match base {
                    Some(base) => write!(f, "{role}({base})"),
                    None => f.write_str(role),
                }
            }
        }
    }
}

/// Type-erased binding key with structural equality over the reified type and
/// the optional annotation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawKey {
    type_id: TypeId,
    type_name: &'static str,
    annotation: Option<Annotation>,
}

impl RawKey {
    pub fn of<T: ?Sized + Injectable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            annotation: None,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.annotation {
            Some(annotation) => write!(f, "{} annotated with {}", self.type_name, annotation),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawKey({self})")
    }
}

/// A [RawKey] that remembers the type it identifies.
pub struct Key<T: ?Sized> {
    raw: RawKey,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Injectable> Key<T> {
    pub fn of() -> Self {
        Self::from_raw(RawKey::of::<T>())
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::from_raw(RawKey::of::<T>().with_annotation(Annotation::named(name)))
    }

    pub fn annotated<A: BindingAnnotation>() -> Self {
        Self::from_raw(RawKey::of::<T>().with_annotation(Annotation::of_type::<A>()))
    }

    pub fn with_annotation(self, annotation: Annotation) -> Self {
        Self::from_raw(self.raw.with_annotation(annotation))
    }

    /// Substitutes the key type while preserving the annotation. This is how
    /// derived keys for composite slots are built from a base key.
    pub fn of_type<U: ?Sized + Injectable>(&self) -> Key<U> {
        let mut raw = RawKey::of::<U>();
        raw.annotation = self.raw.annotation.clone();
        Key::from_raw(raw)
    }

    pub fn raw(&self) -> &RawKey {
        &self.raw
    }

    pub fn into_raw(self) -> RawKey {
        self.raw
    }

    pub(crate) fn from_raw(raw: RawKey) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }
}

/// Shorthand for [Key::of].
pub fn key<T: ?Sized + Injectable>() -> Key<T> {
    Key::of()
}

/// Shorthand for [Key::named].
pub fn named_key<T: ?Sized + Injectable>(name: impl Into<Cow<'static, str>>) -> Key<T> {
    Key::named(name)
}

/// Shorthand for [Key::annotated].
pub fn annotated_key<T: ?Sized + Injectable, A: BindingAnnotation>() -> Key<T> {
    Key::annotated::<A>()
}

impl<T: ?Sized> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: ?Sized> Eq for Key<T> {}

impl<T: ?Sized> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.raw)
    }
}

impl<T: ?Sized> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Web;
    impl BindingAnnotation for Web {}

    trait Service: Send + Sync {}

    #[test]
    fn keys_compare_structurally() {
        assert_eq!(key::<dyn Service>(), key::<dyn Service>());
        assert_eq!(named_key::<dyn Service>("a"), named_key::<dyn Service>("a"));
        assert_ne!(named_key::<dyn Service>("a"), named_key::<dyn Service>("b"));
        assert_ne!(key::<dyn Service>(), annotated_key::<dyn Service, Web>());
        assert_ne!(key::<dyn Service>(), key::<i32>().of_type::<dyn Service>().with_annotation(Annotation::named("x")));
    }

    #[test]
    fn of_type_preserves_annotation() {
        let base = annotated_key::<dyn Service, Web>();
        let derived = base.of_type::<Vec<i32>>();
        assert_eq!(derived.raw().annotation(), base.raw().annotation());
        assert_eq!(derived, annotated_key::<Vec<i32>, Web>());
    }

    #[test]
    fn derived_keys_are_referentially_consistent() {
        let first = named_key::<dyn Service>("web").of_type::<Vec<i32>>();
        let second = named_key::<dyn Service>("web").of_type::<Vec<i32>>();
        assert_eq!(first, second);

        let mut hashes = std::collections::HashSet::new();
        hashes.insert(first);
        assert!(hashes.contains(&second));
    }

    #[test]
    fn element_annotations_are_unique() {
        assert_ne!(Annotation::element("set"), Annotation::element("set"));
    }

    #[test]
    fn role_annotations_are_deterministic() {
        let first = Annotation::role(BindingRole::OptionalDefault, Some(Annotation::named("a")));
        let second = Annotation::role(BindingRole::OptionalDefault, Some(Annotation::named("a")));
        assert_eq!(first, second);
        assert_ne!(
            first,
            Annotation::role(BindingRole::OptionalActual, Some(Annotation::named("a")))
        );
    }

    #[test]
    fn keys_render_for_diagnostics() {
        let rendered = named_key::<dyn Service>("web").to_string();
        assert!(rendered.contains("Service"));
        assert!(rendered.contains("@Named(\"web\")"));
    }
}
