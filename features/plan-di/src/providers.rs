use std::{borrow::Cow, collections::HashMap, fmt, marker::PhantomData, sync::Arc};

use crate::{
    container::Container,
    errors::ArgumentError,
    signature::Signature,
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// A type which knows how to construct itself from its injected dependencies
///
/// Types implementing this can be registered without naming a provider.
pub trait Constructible: Injectable + Sized {
    /// Returns the parameters the type needs to be constructed
    fn signature() -> Signature;

    /// Constructs a new instance from the keyword bound arguments
    ///
    /// Returns the constructed instance, or an error if an argument is missing or construction failed
    fn construct(args: &Arguments) -> Result<Self, DynError>;
}

/// Wrapper Trait for providers, producing instances of Any
pub trait DynProvider: Send + Sync {
    /// Returns the typeinfo of the instances this provider produces
    fn produces(&self) -> TypeInfo;

    /// Returns the parameters the provider takes
    fn signature(&self) -> Signature;

    /// Produces a new instance from already resolved arguments
    fn provide(&self, args: &Arguments) -> Result<Instance, DynError>;
}

struct ConstructibleProvider<T>(PhantomData<fn() -> T>);
impl<T: Constructible> DynProvider for ConstructibleProvider<T> {
    fn produces(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn signature(&self) -> Signature {
        T::signature()
    }

    fn provide(&self, args: &Arguments) -> Result<Instance, DynError> {
        // Forward the call to the specific implementation
        T::construct(args).map(Instance::new)
    }
}

struct FnProvider<F, T> {
    signature: Signature,
    function: F,
    _marker: PhantomData<fn() -> T>,
}
impl<F, T> DynProvider for FnProvider<F, T>
where
    F: Fn(&Arguments) -> Result<T, DynError> + Send + Sync + 'static,
    T: Injectable,
{
    fn produces(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn provide(&self, args: &Arguments) -> Result<Instance, DynError> {
        (self.function)(args).map(Instance::new)
    }
}

// Always hands out the same, already created instance
struct InstanceProvider(Instance);
impl DynProvider for InstanceProvider {
    fn produces(&self) -> TypeInfo {
        self.0.info
    }

    fn signature(&self) -> Signature {
        Signature::new()
    }

    fn provide(&self, _: &Arguments) -> Result<Instance, DynError> {
        Ok(self.0.clone())
    }
}

/// A shareable provider of service instances
///
/// # Example
/// ```rust
/// use plan_di::{Arguments, Provider, Signature};
///
/// struct Greeting(String);
///
/// let provider = Provider::from_fn(Signature::new().untyped("name"), |args| {
///     let name = args.get::<String>("name")?;
///     Ok(Greeting(format!("Hello {name}")))
/// });
///
/// assert_eq!(provider.signature().len(), 1);
/// ```
#[derive(Clone)]
pub struct Provider(Arc<dyn DynProvider>);

impl Provider {
    /// Provider constructing `T` through its [Constructible] implementation
    pub fn of<T: Constructible>() -> Self {
        Provider(Arc::new(ConstructibleProvider::<T>(PhantomData)))
    }

    /// Provider calling `function` with the arguments described by `signature`
    pub fn from_fn<T, F>(signature: Signature, function: F) -> Self
    where
        F: Fn(&Arguments) -> Result<T, DynError> + Send + Sync + 'static,
        T: Injectable,
    {
        Provider(Arc::new(FnProvider {
            signature,
            function,
            _marker: PhantomData,
        }))
    }

    /// Provider which always returns the given instance
    pub fn instance<T: Injectable>(instance: T) -> Self {
        Provider(Arc::new(InstanceProvider(Instance::new(instance))))
    }

    pub fn custom(provider: impl DynProvider + 'static) -> Self {
        Provider(Arc::new(provider))
    }

    pub fn produces(&self) -> TypeInfo {
        self.0.produces()
    }

    pub fn signature(&self) -> Signature {
        self.0.signature()
    }

    pub fn provide(&self, args: &Arguments) -> Result<Instance, DynError> {
        self.0.provide(args)
    }
}
impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Provider").field(&self.produces().type_name).finish()
    }
}

/// Keyword bound dependency instances handed to a provider
#[derive(Debug, Default)]
pub struct Arguments {
    values: HashMap<Cow<'static, str>, Instance>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, instance: Instance) {
        self.values.insert(name.into(), instance);
    }

    /// Gets the argument bound to `name` as `T`
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>, ArgumentError> {
        self.instance(name)?
            .downcast()
            .map_err(|actual_type| ArgumentError::DowncastFailed {
                parameter: name.to_string(),
                required_type: std::any::type_name::<T>(),
                actual_type,
            })
    }

    /// Gets the untyped argument bound to `name`
    pub fn instance(&self, name: &str) -> Result<&Instance, ArgumentError> {
        self.values
            .get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))
    }

    /// Gets the container injected under `name`
    pub fn container(&self, name: &str) -> Result<Container, ArgumentError> {
        self.get::<Container>(name).map(|container| (*container).clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Config;

    #[derive(Debug)]
    struct Cache {
        config: Arc<Config>,
    }
    impl Constructible for Cache {
        fn signature() -> Signature {
            Signature::new().param::<Config>("config")
        }

        fn construct(args: &Arguments) -> Result<Self, DynError> {
            Ok(Cache {
                config: args.get("config")?,
            })
        }
    }

    #[test]
    fn constructible_provider_reads_arguments() {
        let config = Instance::new(Config);
        let mut args = Arguments::new();
        args.insert("config", config.clone());

        let provider = Provider::of::<Cache>();
        assert_eq!(provider.produces(), TypeInfo::of::<Cache>());

        let cache = provider.provide(&args).unwrap().downcast::<Cache>().unwrap();
        assert!(Arc::ptr_eq(&cache.config, &config.downcast::<Config>().unwrap()));
    }

    #[test]
    fn missing_argument_is_reported_by_name() {
        let error = Provider::of::<Cache>()
            .provide(&Arguments::new())
            .unwrap_err();

        assert_eq!(error.to_string(), "No argument was injected for parameter 'config'");
    }

    #[test]
    fn wrong_argument_type_is_reported() {
        let mut args = Arguments::new();
        args.insert("config", Instance::new(5_u8));

        let error = args.get::<Config>("config").unwrap_err();
        assert!(matches!(
            error,
            ArgumentError::DowncastFailed { actual_type: "u8", .. }
        ));
    }

    #[test]
    fn instance_provider_returns_the_same_instance() {
        let provider = Provider::instance(String::from("shared"));
        let first = provider.provide(&Arguments::new()).unwrap();
        let second = provider.provide(&Arguments::new()).unwrap();

        assert!(first.ptr_eq(&second));
        assert!(provider.signature().is_empty());
    }

    #[test]
    fn fn_provider_uses_declared_signature() {
        let provider = Provider::from_fn(Signature::new().untyped("count"), |args| {
            Ok(*args.get::<u32>("count")? + 1)
        });

        let mut args = Arguments::new();
        args.insert("count", Instance::new(41_u32));

        let result = provider.provide(&args).unwrap();
        assert_eq!(*result.downcast::<u32>().unwrap(), 42);
        assert_eq!(provider.signature().parameters()[0].name, "count");
    }
}
