use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use thiserror::Error;

use crate::{descriptor::DescriptorStore, types::ServiceId};

/// Graph of all registered services
/// Used to check for missing and circular dependencies and to order construction
pub struct DependencyGraph<'a> {
    order: Vec<&'a ServiceId>,
    map: HashMap<&'a ServiceId, DependencyGraphEntry<'a>>,
    container_ids: &'a HashSet<ServiceId>,
}
impl<'a> DependencyGraph<'a> {
    /// `container_ids` resolve to the container itself and are never missing
    pub fn new(store: &'a DescriptorStore, container_ids: &'a HashSet<ServiceId>) -> Self {
        let mut graph = Self {
            order: Vec::with_capacity(store.len()),
            map: HashMap::with_capacity(store.len()),
            container_ids,
        };

        for descriptor in store.iter() {
            graph.order.push(&descriptor.id);
            graph.map.insert(
                &descriptor.id,
                DependencyGraphEntry {
                    id: &descriptor.id,
                    dependencies: descriptor
                        .dependencies
                        .iter()
                        .map(|(name, id)| (name, id))
                        .collect(),
                },
            );
        }

        graph
    }

    /// Validate the graph
    ///
    /// Returns the construction order - every service comes after all of its dependencies -
    /// or a list of all issues
    pub fn check(&self) -> Result<Vec<&'a ServiceId>, DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        let mut construction_order = Vec::with_capacity(self.order.len());

        // These resolve to the container, a registration would never be reached
        for id in &self.order {
            if self.container_ids.contains(*id) {
                errors.push(DependencyGraphError::ReservedIdentifier {
                    service: (*id).clone(),
                });
            }
        }

        for id in &self.order {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                &mut construction_order,
                &self.map[id],
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(construction_order);

        fn check_recurse<'a>(
            graph: &DependencyGraph<'a>,
            checked: &mut HashSet<&'a ServiceId>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<&'a ServiceId>,
            construction_order: &mut Vec<&'a ServiceId>,
            entry: &DependencyGraphEntry<'a>,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|id| *id == entry.id) {
                let mut chain: Vec<ServiceId> = dependency_chain[start..]
                    .iter()
                    .map(|id| (*id).clone())
                    .collect();
                chain.push(entry.id.clone()); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency {
                    from: (*dependency_chain[start]).clone(),
                    to: (*dependency_chain.last().unwrap_or(&entry.id)).clone(),
                    chain,
                });
            }

            // Skip other checks if already checked
            if !checked.insert(entry.id) {
                return;
            };

            dependency_chain.push(entry.id);

            for (parameter, dependency) in &entry.dependencies {
                // The container injects itself
                if graph.container_ids.contains(*dependency) {
                    continue;
                }

                let Some(next_entry) = graph.map.get(dependency) else {
                    errors.push(DependencyGraphError::MissingDependency {
                        dependency: (*dependency).clone(),
                        required_by: entry.id.clone(),
                        parameter: parameter.to_string(),
                    });

                    continue;
                };

                check_recurse(
                    graph,
                    checked,
                    errors,
                    dependency_chain,
                    construction_order,
                    next_entry,
                );
            }

            dependency_chain.pop();
            construction_order.push(entry.id);
        }
    }
}

struct DependencyGraphEntry<'a> {
    id: &'a ServiceId,
    dependencies: Vec<(&'a Cow<'static, str>, &'a ServiceId)>,
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("{required_by} needs {dependency} for '{parameter}' but it is not registered")]
    MissingDependency {
        dependency: ServiceId,
        required_by: ServiceId,
        parameter: String,
    },
    #[error("A Circular Dependency exists between {from} and {to} through {}", display_chain(.chain))]
    CircularDependency {
        from: ServiceId,
        to: ServiceId,
        chain: Vec<ServiceId>,
    },
    #[error("{service} is reserved for the container and can not be registered")]
    ReservedIdentifier { service: ServiceId },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

fn display_chain(chain: &[ServiceId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
impl DependencyGraphErrors {
    /// All identifiers which are required but not registered
    pub fn missing(&self) -> impl Iterator<Item = &ServiceId> {
        self.errors.iter().filter_map(|error| match error {
            DependencyGraphError::MissingDependency { dependency, .. } => Some(dependency),
            _ => None,
        })
    }

    /// All dependency chains which loop back onto themselves
    pub fn cycles(&self) -> impl Iterator<Item = &[ServiceId]> {
        self.errors.iter().filter_map(|error| match error {
            DependencyGraphError::CircularDependency { chain, .. } => Some(chain.as_slice()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::{DependencyMap, ServiceDescriptor},
        providers::Provider,
        types::Lifecycle,
    };

    fn store(services: &[(&'static str, &[&'static str])]) -> DescriptorStore {
        let mut store = DescriptorStore::new();
        for (name, dependencies) in services {
            store.insert(ServiceDescriptor {
                id: ServiceId::named(*name),
                provider: Provider::instance(*name),
                dependencies: dependencies
                    .iter()
                    .map(|dep| (Cow::Borrowed(*dep), ServiceId::named(*dep)))
                    .collect::<DependencyMap>(),
                lifecycle: Lifecycle::Transient,
            });
        }
        store
    }

    fn names(order: Vec<&ServiceId>) -> Vec<String> {
        order.into_iter().map(|id| id.name().unwrap_or_default().to_string()).collect()
    }

    #[test]
    fn orders_dependencies_first() {
        let store = store(&[
            ("service", &["config", "cache"]),
            ("cache", &["config"]),
            ("config", &[]),
        ]);
        let container_ids = HashSet::new();

        let order = DependencyGraph::new(&store, &container_ids).check().unwrap();
        assert_eq!(names(order), ["config", "cache", "service"]);
    }

    #[test]
    fn reports_every_missing_dependency() {
        let store = store(&[("service", &["config", "cache"]), ("other", &["config"])]);
        let container_ids = HashSet::new();

        let errors = DependencyGraph::new(&store, &container_ids).check().unwrap_err();
        assert_eq!(errors.errors.len(), 3);
        let missing: HashSet<_> = errors.missing().cloned().collect();
        assert_eq!(
            missing,
            HashSet::from([ServiceId::named("config"), ServiceId::named("cache")])
        );
        assert!(errors.to_string().contains("\"service\" needs \"cache\" for 'cache'"));
    }

    #[test]
    fn container_ids_are_never_missing() {
        let store = store(&[("locator", &["container"])]);
        let container_ids = HashSet::from([ServiceId::named("container")]);

        assert!(DependencyGraph::new(&store, &container_ids).check().is_ok());
    }

    #[test]
    fn container_ids_can_not_be_registered() {
        let store = store(&[("container", &[]), ("locator", &["container"])]);
        let container_ids = HashSet::from([ServiceId::named("container")]);

        let errors = DependencyGraph::new(&store, &container_ids).check().unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert!(matches!(
            &errors.errors[0],
            DependencyGraphError::ReservedIdentifier { service } if *service == ServiceId::named("container")
        ));
    }

    #[test]
    fn detects_self_dependency() {
        let store = store(&[("loop", &["loop"])]);
        let container_ids = HashSet::new();

        let errors = DependencyGraph::new(&store, &container_ids).check().unwrap_err();
        let cycles: Vec<_> = errors.cycles().collect();
        assert_eq!(cycles, [&[ServiceId::named("loop"), ServiceId::named("loop")][..]]);
    }

    #[test]
    fn detects_longer_cycles_once() {
        let store = store(&[
            ("a", &["b"]),
            ("b", &["c"]),
            ("c", &["a"]),
            ("d", &["a"]),
        ]);
        let container_ids = HashSet::new();

        let errors = DependencyGraph::new(&store, &container_ids).check().unwrap_err();
        assert_eq!(errors.errors.len(), 1);
        assert_eq!(
            errors.to_string(),
            "The dependency graph had one or more errors:\n\
             - A Circular Dependency exists between \"a\" and \"c\" through \"a\" -> \"b\" -> \"c\" -> \"a\""
        );
    }
}
