use crate::key::RawKey;
use std::panic::Location;
use std::sync::Arc;
use thiserror::Error;

/// Source location of the configuration call that produced an element.
pub type Source = &'static Location<'static>;

/// Errors raised while building an [Injector](crate::injector::Injector) from
/// modules. All configuration mistakes surface here, at creation time, with
/// the source location of the offending binder call.
#[derive(Error, Clone, Debug)]
pub enum CreationError {
    #[error("{key} was bound twice: first at {first}, again at {second}")]
    DuplicateBinding {
        key: RawKey,
        first: Source,
        second: Source,
    },
    #[error("{key} (bound at {at}) has no implementation; link a target or use to_self()")]
    MissingImplementation { key: RawKey, at: Source },
    #[error("binding required for {key} at {at} was not found")]
    MissingBinding { key: RawKey, at: Source },
    #[error("scope {scope:?} registered at {at} is already defined")]
    DuplicateScope { scope: String, at: Source },
    #[error("{key} (bound at {at}) refers to unknown scope {scope:?}")]
    UnknownScope {
        key: RawKey,
        scope: String,
        at: Source,
    },
    #[error(
        "map binder {map} has two entries for key {entry} (first at {first}, again at {second}); \
         call permit_duplicates() to allow this"
    )]
    DuplicateMapKey {
        map: RawKey,
        entry: String,
        first: Source,
        second: Source,
    },
    #[error(
        "set binder {set} has duplicate element {element} (first at {first}, again at {second}); \
         call permit_duplicates() to allow this"
    )]
    DuplicateSetElement {
        set: RawKey,
        element: String,
        first: Source,
        second: Source,
    },
    #[error("{key} was exposed at {at} but is not bound inside the private module")]
    ExposedButUnbound { key: RawKey, at: Source },
    #[error("static injection requested at {at} failed: {error}")]
    StaticInjection {
        at: Source,
        #[source]
        error: ResolveError,
    },
}

/// Errors raised while resolving instances from an existing injector.
#[derive(Error, Clone, Debug)]
pub enum ResolveError {
    #[error("no binding found for {0}")]
    NoBinding(RawKey),
    #[error("the instance bound for {0} has an incompatible type")]
    IncompatibleInstance(RawKey),
    #[error("dependency cycle detected while creating {0}")]
    DependencyCycle(RawKey),
    #[error("{key} is bound in scope {scope:?}, which this injector does not know")]
    UnrecognizedScope { key: RawKey, scope: String },
    #[error("the injector backing this handle does not exist yet or has been dropped")]
    InjectorUnavailable,
    #[error("instance construction failed: {0}")]
    Failure(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl ResolveError {
    /// Wraps an arbitrary constructor error.
    pub fn failure(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failure(Arc::new(error))
    }
}
