//! Configuration elements. Every call on a [Binder](crate::binder::Binder)
//! appends one of these records; injector creation later interprets the full
//! list. Elements carry the caller's source location so configuration errors
//! point at module code.

use crate::error::{CreationError, ResolveError, Source};
use crate::injector::ResolveContext;
use crate::instance_provider::{InstanceHandle, InstanceProvider};
use crate::key::RawKey;
use crate::provider::EnvHandle;
use crate::scope::ScopeFactoryPtr;
use std::any::Any;
use std::sync::Arc;

/// Erased instance constructor attached to a binding definition.
pub(crate) type ConstructorFn =
    Arc<dyn for<'a, 'c> Fn(&'c mut ResolveContext<'a>) -> Result<InstanceHandle, ResolveError> + Send + Sync>;

/// Helper guiding closure inference towards the higher-ranked signature.
pub(crate) fn constructor<F>(f: F) -> ConstructorFn
where
    F: for<'a, 'c> Fn(&'c mut ResolveContext<'a>) -> Result<InstanceHandle, ResolveError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Builds a collection instance from the element keys gathered for one set
/// binder.
pub(crate) type SetAssembler = Arc<
    dyn Fn(&mut dyn InstanceProvider, &[RawKey]) -> Result<InstanceHandle, ResolveError>
        + Send
        + Sync,
>;

/// Builds a map-shaped instance from the entries gathered for one map binder.
pub(crate) type MapAssembler = Arc<
    dyn Fn(&mut dyn InstanceProvider, &[MapEntryRecord]) -> Result<InstanceHandle, ResolveError>
        + Send
        + Sync,
>;

/// Creation-time duplicate-key check for one map binder.
pub(crate) type MapEntryCheck =
    Arc<dyn Fn(&RawKey, &[MapEntryRecord]) -> Result<(), CreationError> + Send + Sync>;

pub(crate) type StaticInjectionFn =
    fn(&mut dyn InstanceProvider) -> Result<(), ResolveError>;

/// Identifies what a binding was linked to, for duplicate-element detection
/// in set binders.
#[derive(Clone)]
pub(crate) enum TargetId {
    /// Linked to another key.
    Linked(RawKey),
    /// Bound to a pre-existing instance, compared by pointer identity.
    Instance(InstanceHandle),
    /// Bound through a provider type.
    Provider(RawKey),
    /// No meaningful identity (closures, synthesized bindings).
    Opaque,
}

impl TargetId {
    /// Token under which two targets count as the same contribution.
    pub(crate) fn dedup_token(&self) -> Option<DedupToken> {
        match self {
            Self::Linked(key) => Some(DedupToken::Linked(key.clone())),
            Self::Provider(key) => Some(DedupToken::Provider(key.clone())),
            Self::Instance(handle) => {
                Some(DedupToken::Pointer(Arc::as_ptr(handle) as *const () as usize))
            }
            Self::Opaque => None,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Linked(key) => key.to_string(),
            Self::Provider(key) => format!("provider {key}"),
            Self::Instance(_) => "bound instance".to_string(),
            Self::Opaque => "opaque target".to_string(),
        }
    }
}

impl std::fmt::Debug for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) enum DedupToken {
    Linked(RawKey),
    Provider(RawKey),
    Pointer(usize),
}

/// One `bind` call. The chained builders fill in target and scope.
pub(crate) struct BindingElement {
    pub key: RawKey,
    pub target: Option<(ConstructorFn, TargetId)>,
    pub scope: Option<String>,
    pub source: Source,
}

/// One set binder, created once per set key and binder.
pub(crate) struct SetBinderElement {
    pub set_key: RawKey,
    pub provider_set_key: RawKey,
    pub permit_duplicates: bool,
    pub assemble_instances: SetAssembler,
    pub assemble_providers: SetAssembler,
    pub source: Source,
}

/// One map binder, created once per map key and binder.
pub(crate) struct MapBinderElement {
    pub map_key: RawKey,
    pub provider_map_key: RawKey,
    pub entries_key: RawKey,
    pub multimap_key: RawKey,
    pub permit_duplicates: bool,
    pub assemble_map: MapAssembler,
    pub assemble_provider_map: MapAssembler,
    pub assemble_entries: MapAssembler,
    pub assemble_multimap: MapAssembler,
    pub check_entries: MapEntryCheck,
    pub source: Source,
}

/// One contributed map entry. The entry key is erased here and recovered by
/// the typed assemblers captured in the owning [MapBinderElement].
pub(crate) struct MapEntryRecord {
    pub entry: Box<dyn Any + Send + Sync>,
    pub value_key: RawKey,
    pub source: Source,
}

/// One optional binder, created once per base key and binder.
pub(crate) struct OptionalBinderElement {
    pub key: RawKey,
    pub option_key: RawKey,
    pub option_provider_key: RawKey,
    pub bind_base: ConstructorFn,
    pub bind_option: ConstructorFn,
    pub bind_option_provider: ConstructorFn,
    pub source: Source,
}

pub(crate) enum Element {
    Binding(BindingElement),
    ScopeBinding {
        name: String,
        factory: ScopeFactoryPtr,
        source: Source,
    },
    RequireBinding {
        key: RawKey,
        source: Source,
    },
    StaticInjection {
        run: StaticInjectionFn,
        source: Source,
    },
    SetBinder(SetBinderElement),
    SetEntry {
        set_key: RawKey,
        element_key: RawKey,
        source: Source,
    },
    MapBinder(MapBinderElement),
    MapEntry {
        map_key: RawKey,
        record: MapEntryRecord,
    },
    OptionalBinder(OptionalBinderElement),
    PrivateEnvironment {
        elements: Vec<Element>,
        exposed: Vec<(RawKey, Source)>,
        env_handle: EnvHandle,
    },
}
