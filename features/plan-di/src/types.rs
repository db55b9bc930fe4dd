use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::{container::Container, providers::Provider};

/// All errors must be Send + Sync so containers can be shared across threads
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Containers may be resolved from several threads at once,
/// so anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Instance of a Provider
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    /// Wraps an already shared value without reallocating it
    pub fn from_arc<ExistingInstance: Injectable>(instance: Arc<ExistingInstance>) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance,
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// True if both point at the very same allocation
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(&other.instance))
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Sharing policy of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// A new instance on every resolution
    Transient,
    /// One instance per scope - the root container counts as a scope
    Scoped,
    /// One instance per root container, shared with every scope derived from it
    Singleton,
}
impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Transient => f.write_str("transient"),
            Lifecycle::Scoped => f.write_str("scoped"),
            Lifecycle::Singleton => f.write_str("singleton"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ServiceKey {
    Type(TypeInfo),
    Named(Arc<str>),
}

/// Identifies a registrable service
///
/// Either a Rust type or a plain name. A type identifier may also know how to
/// construct its own type, which allows registering it without a provider.
///
/// Equality and hashing only consider the type or the name.
#[derive(Clone)]
pub struct ServiceId {
    key: ServiceKey,
    inherent: Option<fn() -> Provider>,
}

impl ServiceId {
    /// Identifier for any type, including trait objects used as interface tags
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            key: ServiceKey::Type(TypeInfo::of::<T>()),
            inherent: None,
        }
    }

    /// Identifier for a type which can construct itself
    pub fn constructible<T: crate::providers::Constructible>() -> Self {
        Self {
            key: ServiceKey::Type(TypeInfo::of::<T>()),
            inherent: Some(Provider::of::<T> as fn() -> Provider),
        }
    }

    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            key: ServiceKey::Named(name.into()),
            inherent: None,
        }
    }

    /// The reserved identifier which always resolves to the resolving container
    pub fn container() -> Self {
        Self::of::<Container>()
    }

    pub fn type_info(&self) -> Option<TypeInfo> {
        match &self.key {
            ServiceKey::Type(info) => Some(*info),
            ServiceKey::Named(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.key {
            ServiceKey::Type(_) => None,
            ServiceKey::Named(name) => Some(name),
        }
    }

    pub fn is_constructible(&self) -> bool {
        self.inherent.is_some()
    }

    /// The provider this identifier can build itself with, if any
    pub fn inherent_provider(&self) -> Option<Provider> {
        self.inherent.map(|make| make())
    }
}

impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for ServiceId {}
impl Hash for ServiceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            ServiceKey::Type(info) => f.write_str(info.type_name),
            ServiceKey::Named(name) => write!(f, "\"{name}\""),
        }
    }
}
impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({self})")
    }
}

impl From<&'static str> for ServiceId {
    fn from(name: &'static str) -> Self {
        ServiceId::named(name)
    }
}
impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        ServiceId::named(name)
    }
}
impl From<TypeInfo> for ServiceId {
    fn from(info: TypeInfo) -> Self {
        Self {
            key: ServiceKey::Type(info),
            inherent: None,
        }
    }
}
