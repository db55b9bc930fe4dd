use std::{collections::HashSet, sync::Arc};

use crate::{
    extractor::{DependencyExtractor, NameExtractor, TypeExtractor},
    types::ServiceId,
};

/// Which built in extractor a builder uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Parameters are bound by their declared type
    #[default]
    ByType,
    /// Parameters are bound by their name
    ByName,
}
impl ExtractionStrategy {
    pub fn extractor(self) -> Arc<dyn DependencyExtractor> {
        match self {
            ExtractionStrategy::ByType => Arc::new(TypeExtractor),
            ExtractionStrategy::ByName => Arc::new(NameExtractor),
        }
    }
}

/// Settings of a [crate::ContainerBuilder]
///
/// # Example
/// ```rust
/// use plan_di::{BuilderConfig, ContainerBuilder, ExtractionStrategy, ServiceId};
///
/// let config = BuilderConfig::default()
///     .with_extraction(ExtractionStrategy::ByName)
///     .with_container_name("AppContainer")
///     .with_container_alias(ServiceId::named("container"));
///
/// let builder = ContainerBuilder::with_config(config);
/// assert!(builder.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub extraction: ExtractionStrategy,
    /// Name written into generated plan sources
    pub container_name: String,
    /// Identifiers which resolve to the container, next to [ServiceId::container]
    pub container_aliases: Vec<ServiceId>,
}
impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionStrategy::default(),
            container_name: "GeneratedContainer".to_string(),
            container_aliases: Vec::new(),
        }
    }
}

impl BuilderConfig {
    /// Name based extraction, with a parameter named `container` receiving the container
    pub fn by_name() -> Self {
        Self::default()
            .with_extraction(ExtractionStrategy::ByName)
            .with_container_alias(ServiceId::named("container"))
    }

    pub fn with_extraction(mut self, extraction: ExtractionStrategy) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    pub fn with_container_alias(mut self, alias: ServiceId) -> Self {
        self.container_aliases.push(alias);
        self
    }

    /// Every identifier which resolves to the container
    pub fn container_ids(&self) -> HashSet<ServiceId> {
        let mut ids: HashSet<ServiceId> = self.container_aliases.iter().cloned().collect();
        ids.insert(ServiceId::container());
        ids
    }
}
