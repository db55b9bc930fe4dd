use std::sync::Arc;

use thiserror::Error;

use crate::{dependency_graph::DependencyGraphErrors, types::{DynError, ServiceId}};

/// Errors when registering a service on the builder
#[derive(Error, Debug, Clone)]
pub enum RegisterError {
    /// No provider was given and the identifier can't construct itself
    #[error("No provider given for {0} and it can not be constructed directly")]
    CannotInferProvider(ServiceId),
}

/// Errors a provider runs into while reading its arguments
#[derive(Error, Debug, Clone)]
pub enum ArgumentError {
    /// Nothing was injected under that parameter name
    #[error("No argument was injected for parameter '{0}'")]
    Missing(String),

    #[error("Argument '{parameter}' has the wrong type, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        parameter: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors when resolving a service from a container
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The requested identifier was never registered
    #[error("Service {0} is not registered")]
    ServiceNotFound(ServiceId),

    /// A provider failed while constructing
    #[error("Provider for {service} failed - error: {error}")]
    ProviderFailed {
        service: ServiceId,
        error: Arc<DynError>,
    },

    /// The scope this container belongs to has already been exited
    #[error("The scope was already exited")]
    ScopeClosed,

    #[error("Failed to downcast {service}, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        service: ServiceId,
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors when leaving a scope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The root container is not a scope that can be left
    #[error("The root container has no scope to exit")]
    RootScope,
    #[error("The scope was already exited")]
    AlreadyExited,
}

/// Errors when emitting or loading a construction plan source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Graph(#[from] DependencyGraphErrors),

    #[error("Malformed construction plan source: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The source names a service the builder does not know
    #[error("The plan source references {0} which is not registered")]
    UnknownService(String),

    /// A registered service has no step in the source
    #[error("The plan source does not cover {0} which is registered")]
    MissingService(String),

    #[error("Step for {service} is invalid: {reason}")]
    InvalidStep { service: String, reason: String },
}
