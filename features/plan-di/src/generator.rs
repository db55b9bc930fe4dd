use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

use serde::{Deserialize, Serialize};

use crate::{
    dependency_graph::{DependencyGraph, DependencyGraphErrors},
    descriptor::{DescriptorStore, ServiceDescriptor},
    errors::SourceError,
    providers::Provider,
    types::{Lifecycle, ServiceId},
};

/// Where a dependency of a step comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyRef {
    /// Constructed by the step in this slot - always an earlier one
    Slot(usize),
    /// The container doing the resolution
    Container,
}

/// Recipe for constructing one service
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub id: ServiceId,
    pub lifecycle: Lifecycle,
    pub provider: Provider,
    pub dependencies: Vec<(Cow<'static, str>, DependencyRef)>,
}

/// The compiled construction routine of a container type
///
/// Steps are ordered so that every step only depends on steps before it.
#[derive(Debug, Clone)]
pub struct ConstructionPlan {
    name: String,
    steps: Vec<PlanStep>,
    slots: HashMap<ServiceId, usize>,
    container_ids: HashSet<ServiceId>,
}

impl ConstructionPlan {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn slot_of(&self, id: &ServiceId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    /// True if `id` resolves to the container itself
    pub fn is_container_id(&self, id: &ServiceId) -> bool {
        self.container_ids.contains(id)
    }

    pub(crate) fn step(&self, slot: usize) -> &PlanStep {
        &self.steps[slot]
    }

    /// Describes the plan in its serializable form
    pub fn source(&self) -> PlanSource {
        PlanSource {
            container: self.name.clone(),
            services: self
                .steps
                .iter()
                .enumerate()
                .map(|(slot, step)| StepSource {
                    slot,
                    service: step.id.to_string(),
                    lifecycle: step.lifecycle,
                    provider: step.provider.produces().type_name.to_string(),
                    dependencies: step
                        .dependencies
                        .iter()
                        .map(|(parameter, target)| DependencySource {
                            parameter: parameter.to_string(),
                            target: match target {
                                DependencyRef::Slot(slot) => TargetSource::Slot { slot: *slot },
                                DependencyRef::Container => TargetSource::Container,
                            },
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Serializable form of a [ConstructionPlan]
///
/// Meant for inspection and caching - providers are referenced by the
/// service they are registered for and rebound when loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSource {
    pub container: String,
    pub services: Vec<StepSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSource {
    pub slot: usize,
    pub service: String,
    pub lifecycle: Lifecycle,
    /// Type produced by the provider, informational only
    pub provider: String,
    #[serde(default)]
    pub dependencies: Vec<DependencySource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySource {
    pub parameter: String,
    pub target: TargetSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetSource {
    Slot { slot: usize },
    Container,
}

impl PlanSource {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

/// Turns validated descriptors into a [ConstructionPlan]
pub struct PlanGenerator {
    name: String,
    container_ids: HashSet<ServiceId>,
}

impl PlanGenerator {
    pub fn new(name: impl Into<String>, container_ids: HashSet<ServiceId>) -> Self {
        Self {
            name: name.into(),
            container_ids,
        }
    }

    /// Validates the descriptors and orders them into a plan
    ///
    /// Fails with every missing or circular dependency before any step is emitted.
    pub fn generate(&self, store: &DescriptorStore) -> Result<ConstructionPlan, DependencyGraphErrors> {
        let construction_order = DependencyGraph::new(store, &self.container_ids).check()?;

        let slots: HashMap<ServiceId, usize> = construction_order
            .iter()
            .enumerate()
            .map(|(slot, id)| ((*id).clone(), slot))
            .collect();

        let steps: Vec<PlanStep> = construction_order
            .iter()
            .filter_map(|id| store.get(id))
            .map(|descriptor| self.emit_step(descriptor, &slots))
            .collect();

        tracing::debug!(
            "Generated construction plan '{}' with {} steps",
            self.name,
            steps.len()
        );

        Ok(ConstructionPlan {
            name: self.name.clone(),
            steps,
            slots,
            container_ids: self.container_ids.clone(),
        })
    }

    /// Rebinds a previously emitted plan to the providers registered in `store`
    ///
    /// The source has to match the registrations exactly. Lifecycles and bindings are
    /// never taken from the source alone, only the slot order is.
    pub fn load(&self, store: &DescriptorStore, source: &PlanSource) -> Result<ConstructionPlan, SourceError> {
        DependencyGraph::new(store, &self.container_ids).check()?;

        let registered: HashMap<String, &ServiceDescriptor> = store
            .iter()
            .map(|descriptor| (descriptor.id.to_string(), descriptor))
            .collect();

        let mut slots: HashMap<ServiceId, usize> = HashMap::with_capacity(source.services.len());
        let mut steps = Vec::with_capacity(source.services.len());

        for (index, step) in source.services.iter().enumerate() {
            let invalid = |reason: String| SourceError::InvalidStep {
                service: step.service.clone(),
                reason,
            };

            if step.slot != index {
                return Err(invalid(format!("listed at slot {} but expected {index}", step.slot)));
            }

            let descriptor = registered
                .get(&step.service)
                .ok_or_else(|| SourceError::UnknownService(step.service.clone()))?;

            if step.lifecycle != descriptor.lifecycle {
                return Err(invalid(format!(
                    "listed as {} but registered as {}",
                    step.lifecycle, descriptor.lifecycle
                )));
            }

            let mut expected = Vec::with_capacity(descriptor.dependencies.len());
            for (parameter, id) in descriptor.dependencies.iter() {
                let target = if self.container_ids.contains(id) {
                    TargetSource::Container
                } else if let Some(slot) = slots.get(id) {
                    TargetSource::Slot { slot: *slot }
                } else {
                    return Err(invalid(format!(
                        "'{parameter}' needs {id} which is not constructed before it"
                    )));
                };
                expected.push(DependencySource {
                    parameter: parameter.to_string(),
                    target,
                });
            }

            if step.dependencies != expected {
                return Err(invalid("dependencies differ from the registration".to_string()));
            }

            if slots.insert(descriptor.id.clone(), index).is_some() {
                return Err(invalid("listed more than once".to_string()));
            }

            steps.push(self.emit_step(descriptor, &slots));
        }

        if let Some(uncovered) = store.iter().find(|descriptor| !slots.contains_key(&descriptor.id)) {
            return Err(SourceError::MissingService(uncovered.id.to_string()));
        }

        Ok(ConstructionPlan {
            name: source.container.clone(),
            steps,
            slots,
            container_ids: self.container_ids.clone(),
        })
    }

    fn emit_step(&self, descriptor: &ServiceDescriptor, slots: &HashMap<ServiceId, usize>) -> PlanStep {
        let dependencies = descriptor
            .dependencies
            .iter()
            .map(|(parameter, id)| {
                let target = if self.container_ids.contains(id) {
                    DependencyRef::Container
                } else {
                    // The graph check guarantees every other dependency has a slot
                    DependencyRef::Slot(slots[id])
                };
                (parameter.clone(), target)
            })
            .collect();

        PlanStep {
            id: descriptor.id.clone(),
            lifecycle: descriptor.lifecycle,
            provider: descriptor.provider.clone(),
            dependencies,
        }
    }
}
