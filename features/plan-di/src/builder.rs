use std::sync::Arc;

use crate::{
    config::BuilderConfig,
    container::{Container, ContainerType},
    dependency_graph::DependencyGraphErrors,
    descriptor::{DescriptorStore, ServiceDescriptor},
    errors::{RegisterError, SourceError},
    extractor::DependencyExtractor,
    generator::{PlanGenerator, PlanSource},
    providers::{Constructible, Provider},
    types::{Lifecycle, ServiceId},
};

/// Collects service registrations and generates container types from them
///
/// The extractor in use when a service is registered decides its dependencies,
/// so configure it before registering.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use plan_di::{Arguments, Constructible, ContainerBuilder, DynError, Signature};
///
/// struct Config;
/// impl Constructible for Config {
///     fn signature() -> Signature {
///         Signature::new()
///     }
///     fn construct(_: &Arguments) -> Result<Self, DynError> {
///         Ok(Config)
///     }
/// }
///
/// struct Cache {
///     config: Arc<Config>,
/// }
/// impl Constructible for Cache {
///     fn signature() -> Signature {
///         Signature::new().param::<Config>("config")
///     }
///     fn construct(args: &Arguments) -> Result<Self, DynError> {
///         Ok(Cache { config: args.get("config")? })
///     }
/// }
///
/// let container = ContainerBuilder::new()
///     .add_singleton_type::<Config>()
///     .add_transient_type::<Cache>()
///     .build()
///     .unwrap();
///
/// let cache = container.require::<Cache>().unwrap();
/// assert!(Arc::ptr_eq(&cache.config, &container.require::<Config>().unwrap()));
/// ```
pub struct ContainerBuilder {
    store: DescriptorStore,
    extractor: Arc<dyn DependencyExtractor>,
    config: BuilderConfig,
}
impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        ContainerBuilder {
            store: DescriptorStore::new(),
            extractor: config.extraction.extractor(),
            config,
        }
    }

    /// Replaces the extractor used for all following registrations
    pub fn with_extractor(mut self, extractor: impl DependencyExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }
}

// Registration
impl ContainerBuilder {
    /// Registers `id` with the given lifecycle
    ///
    /// Without a provider, `id` must be able to construct itself - see [ServiceId::constructible].
    /// Registering the same identifier again replaces the earlier registration.
    pub fn register(
        mut self,
        id: impl Into<ServiceId>,
        provider: Option<Provider>,
        lifecycle: Lifecycle,
    ) -> Result<Self, RegisterError> {
        let id = id.into();
        let Some(provider) = provider.or_else(|| id.inherent_provider()) else {
            return Err(RegisterError::CannotInferProvider(id));
        };

        self.insert(id, provider, lifecycle);
        Ok(self)
    }

    /// Registers `id` as a transient service.
    /// A new instance is created every time it is requested.
    pub fn add_transient(
        self,
        id: impl Into<ServiceId>,
        provider: Option<Provider>,
    ) -> Result<Self, RegisterError> {
        self.register(id, provider, Lifecycle::Transient)
    }

    /// Registers `id` as a scoped service.
    /// Every scope has its own instance, the root container counts as a scope.
    pub fn add_scoped(
        self,
        id: impl Into<ServiceId>,
        provider: Option<Provider>,
    ) -> Result<Self, RegisterError> {
        self.register(id, provider, Lifecycle::Scoped)
    }

    /// Registers `id` as a singleton.
    /// A root container and all of its scopes share one instance.
    pub fn add_singleton(
        self,
        id: impl Into<ServiceId>,
        provider: Option<Provider>,
    ) -> Result<Self, RegisterError> {
        self.register(id, provider, Lifecycle::Singleton)
    }

    pub fn add_transient_type<T: Constructible>(mut self) -> Self {
        self.insert(ServiceId::constructible::<T>(), Provider::of::<T>(), Lifecycle::Transient);
        self
    }

    pub fn add_scoped_type<T: Constructible>(mut self) -> Self {
        self.insert(ServiceId::constructible::<T>(), Provider::of::<T>(), Lifecycle::Scoped);
        self
    }

    pub fn add_singleton_type<T: Constructible>(mut self) -> Self {
        self.insert(ServiceId::constructible::<T>(), Provider::of::<T>(), Lifecycle::Singleton);
        self
    }

    fn insert(&mut self, id: ServiceId, provider: Provider, lifecycle: Lifecycle) {
        let dependencies = self.extractor.extract(&provider.signature());

        if let Some(replaced) = self.store.insert(ServiceDescriptor {
            id,
            provider,
            dependencies,
            lifecycle,
        }) {
            tracing::debug!(
                "Replaced {} registration of {}",
                replaced.lifecycle,
                replaced.id
            );
        }
    }
}

// Building
impl ContainerBuilder {
    /// Returns a new container *type* with all the services registered in this builder.
    ///
    /// Fails with every missing and circular dependency found.
    pub fn build_type(&self) -> Result<ContainerType, DependencyGraphErrors> {
        let plan = self.generator().generate(&self.store)?;
        Ok(ContainerType::new(plan))
    }

    /// Returns a new root container with all the services registered in this builder.
    ///
    /// Note: this generates a new container type on every call.
    /// Keep the result of [ContainerBuilder::build_type] around when containers are needed repeatedly.
    pub fn build(&self) -> Result<Container, DependencyGraphErrors> {
        Ok(self.build_type()?.instantiate())
    }

    /// Returns the construction plan as JSON.
    /// Can be stored and later turned back into a container type with [ContainerBuilder::load_type].
    pub fn generated_source(&self) -> Result<String, SourceError> {
        let plan = self.generator().generate(&self.store)?;
        Ok(plan.source().to_json()?)
    }

    /// Loads a container type from a source produced by [ContainerBuilder::generated_source],
    /// binding it to the providers registered on this builder.
    ///
    /// Fails if the source no longer matches the registrations or the registrations
    /// themselves have graph errors.
    pub fn load_type(&self, source: &str) -> Result<ContainerType, SourceError> {
        let source = PlanSource::from_json(source)?;
        let plan = self.generator().load(&self.store, &source)?;
        Ok(ContainerType::new(plan))
    }

    fn generator(&self) -> PlanGenerator {
        PlanGenerator::new(self.config.container_name.clone(), self.config.container_ids())
    }
}

// Inspection
impl ContainerBuilder {
    /// Registered descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.store.iter()
    }

    pub fn descriptor(&self, id: &ServiceId) -> Option<&ServiceDescriptor> {
        self.store.get(id)
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
