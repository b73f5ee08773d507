#![allow(dead_code)]

use bindery::error::ResolveError;
use bindery::inject::{Inject, TypedProvider};
use bindery::instance_provider::{InstancePtr, InstanceProvider, TypedInstanceProvider};
use bindery::key::BindingAnnotation;

pub trait A: Send + Sync {
    fn get(&self) -> String;
}

pub struct AImpl;

impl A for AImpl {
    fn get(&self) -> String {
        "Impl of A".to_string()
    }
}

impl Inject for AImpl {
    fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        Ok(AImpl)
    }
}

bindery::implements!(AImpl => dyn A);

pub struct B;

impl A for B {
    fn get(&self) -> String {
        "This is B".to_string()
    }
}

impl Inject for B {
    fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        Ok(B)
    }
}

bindery::implements!(B => dyn A);

pub struct Annotated;

impl BindingAnnotation for Annotated {}

pub struct AContainer {
    pub a: InstancePtr<dyn A>,
}

impl Inject for AContainer {
    fn create(provider: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        Ok(Self {
            a: provider.instance::<dyn A>()?,
        })
    }
}

pub struct BProvider;

impl Inject for BProvider {
    fn create(_: &mut dyn InstanceProvider) -> Result<Self, ResolveError> {
        Ok(BProvider)
    }
}

impl TypedProvider<dyn A> for BProvider {
    fn get(&self, _: &mut dyn InstanceProvider) -> Result<InstancePtr<dyn A>, ResolveError> {
        Ok(InstancePtr::new(B))
    }
}
