#![allow(dead_code)]

use std::sync::Arc;

use plan_di::{
    Arguments, Constructible, ContainerBuilder, ContainerType, DynError, Provider, ServiceId,
    Signature,
};

pub trait SingletonApi {}
pub trait ScopedApi {}
pub trait TransientApi {}

#[derive(Debug)]
pub struct SingletonService;
impl SingletonApi for SingletonService {}
impl Constructible for SingletonService {
    fn signature() -> Signature {
        Signature::new()
    }

    fn construct(_: &Arguments) -> Result<Self, DynError> {
        Ok(SingletonService)
    }
}

#[derive(Debug)]
pub struct ScopedService {
    pub singleton: Arc<SingletonService>,
}
impl ScopedApi for ScopedService {}
impl Constructible for ScopedService {
    fn signature() -> Signature {
        Signature::new().param::<dyn SingletonApi>("singleton")
    }

    fn construct(args: &Arguments) -> Result<Self, DynError> {
        Ok(ScopedService {
            singleton: args.get("singleton")?,
        })
    }
}

#[derive(Debug)]
pub struct TransientService {
    pub singleton: Arc<SingletonService>,
    pub scoped: Arc<ScopedService>,
}
impl TransientApi for TransientService {}
impl Constructible for TransientService {
    fn signature() -> Signature {
        Signature::new()
            .param::<dyn SingletonApi>("singleton")
            .param::<dyn ScopedApi>("scoped")
    }

    fn construct(args: &Arguments) -> Result<Self, DynError> {
        Ok(TransientService {
            singleton: args.get("singleton")?,
            scoped: args.get("scoped")?,
        })
    }
}

pub fn singleton_id() -> ServiceId {
    ServiceId::of::<dyn SingletonApi>()
}

pub fn scoped_id() -> ServiceId {
    ServiceId::of::<dyn ScopedApi>()
}

pub fn transient_id() -> ServiceId {
    ServiceId::of::<dyn TransientApi>()
}

/// One service of every lifecycle, registered under their interfaces
pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
        .add_singleton(singleton_id(), Some(Provider::of::<SingletonService>()))
        .and_then(|builder| builder.add_scoped(scoped_id(), Some(Provider::of::<ScopedService>())))
        .and_then(|builder| {
            builder.add_transient(transient_id(), Some(Provider::of::<TransientService>()))
        })
        .expect("all services have providers")
}

pub fn container_type() -> ContainerType {
    builder().build_type().expect("graph is complete")
}
