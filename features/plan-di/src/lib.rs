//! Plan DI turns a registry of service providers into a container type with a
//! precomputed construction plan.
//!
//! Dependencies are extracted once, when a service is registered. Building
//! validates the whole graph - missing and circular dependencies are reported
//! together, before any container exists - and orders the services so each one
//! is constructed after its dependencies. Resolving a service then only walks
//! the precomputed plan.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use plan_di::{Arguments, Constructible, ContainerBuilder, DynError, Signature};
//!
//! struct Config;
//! impl Constructible for Config {
//!     fn signature() -> Signature {
//!         Signature::new()
//!     }
//!     fn construct(_: &Arguments) -> Result<Self, DynError> {
//!         Ok(Config)
//!     }
//! }
//!
//! struct Session {
//!     config: Arc<Config>,
//! }
//! impl Constructible for Session {
//!     fn signature() -> Signature {
//!         Signature::new().param::<Config>("config")
//!     }
//!     fn construct(args: &Arguments) -> Result<Self, DynError> {
//!         Ok(Session { config: args.get("config")? })
//!     }
//! }
//!
//! let container_type = ContainerBuilder::new()
//!     .add_singleton_type::<Config>()
//!     .add_scoped_type::<Session>()
//!     .build_type()
//!     .unwrap();
//!
//! let container = container_type.instantiate();
//! container.with_scope(|scope| {
//!     let session = scope.require::<Session>().unwrap();
//!     assert!(Arc::ptr_eq(&session, &scope.require::<Session>().unwrap()));
//!     assert!(Arc::ptr_eq(&session.config, &container.require::<Config>().unwrap()));
//! });
//! ```
//!
//! Plan DI consists of the following components:
//!
//! 1. Signature and Extractor - describing what a provider takes, and mapping that to service identifiers
//! 2. Builder - for registering services with a [Lifecycle]
//! 3. Generator - for validating the dependency graph and emitting the construction plan
//! 4. Container - for resolving services, caching them and entering scopes

pub mod builder;
pub mod config;
pub mod container;
pub mod dependency_graph;
pub mod descriptor;
pub mod errors;
pub mod extractor;
pub mod generator;
pub mod providers;
pub mod signature;
pub mod types;

pub use builder::ContainerBuilder;
pub use config::{BuilderConfig, ExtractionStrategy};
pub use container::{Container, ContainerType, ScopeGuard};
pub use dependency_graph::{DependencyGraphError, DependencyGraphErrors};
pub use errors::{ArgumentError, RegisterError, ResolveError, ScopeError, SourceError};
pub use extractor::{DependencyExtractor, NameExtractor, TypeExtractor};
pub use generator::{ConstructionPlan, DependencySource, PlanSource, StepSource, TargetSource};
pub use providers::{Arguments, Constructible, DynProvider, Provider};
pub use signature::{Parameter, ParameterKind, Signature};
pub use types::{DynError, Injectable, Instance, Lifecycle, ServiceId, TypeInfo};
