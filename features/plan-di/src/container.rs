use std::{
    any::type_name,
    fmt::Debug,
    ops::Deref,
    sync::Arc,
};

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::{
    errors::{ResolveError, ScopeError},
    generator::{ConstructionPlan, DependencyRef, PlanSource, PlanStep},
    providers::Arguments,
    types::{Injectable, Instance, Lifecycle, ServiceId},
};

/// A generated container type
///
/// Reusable blueprint - every call to [ContainerType::instantiate] creates a new
/// root container with its own singletons.
#[derive(Debug, Clone)]
pub struct ContainerType {
    plan: Arc<ConstructionPlan>,
}

impl ContainerType {
    pub(crate) fn new(plan: ConstructionPlan) -> Self {
        Self {
            plan: Arc::new(plan),
        }
    }

    /// Creates a new root container
    pub fn instantiate(&self) -> Container {
        tracing::debug!("Instantiating root container '{}'", self.plan.name());
        Container::new_root(self.plan.clone())
    }

    pub fn plan(&self) -> &ConstructionPlan {
        &self.plan
    }

    pub fn source(&self) -> PlanSource {
        self.plan.source()
    }
}

/// One lazily filled cell per plan step
struct InstanceCache {
    slots: Box<[OnceCell<Instance>]>,
}
impl InstanceCache {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceCell::new()).collect(),
        }
    }

    /// Constructs at most once per slot, even under concurrent first access
    ///
    /// A failed construction leaves the slot empty.
    fn get_or_try_init(
        &self,
        slot: usize,
        construct: impl FnOnce() -> Result<Instance, ResolveError>,
    ) -> Result<Instance, ResolveError> {
        self.slots[slot].get_or_try_init(construct).cloned()
    }

    fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }
}

/// Container resolving services according to its construction plan
///
/// Cheap to clone - all clones are the same container.
///
/// A root container owns the singletons. Scoped containers derived from it via
/// [Container::enter_scope] have their own scoped instances but share the
/// singletons of their root.
///
/// Note: a singleton or scoped service holding on to the container keeps the
/// container alive for as long as it is cached. Exiting a scope releases its
/// cache, the root cache lives as long as the root.
#[derive(Clone)]
pub struct Container(Arc<ContainerInner>);
struct ContainerInner {
    plan: Arc<ConstructionPlan>,
    state: ContainerState,
    /// None once the scope was exited
    scoped: RwLock<Option<Arc<InstanceCache>>>,
}
enum ContainerState {
    Root {
        singletons: InstanceCache,
    },
    Scoped {
        root: Container,
        parent: Container,
        depth: usize,
    },
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scoped = self.0.scoped.read();
        f.debug_struct("Container")
            .field("plan", &self.0.plan.name())
            .field("depth", &self.depth())
            .field("services", &self.0.plan.len())
            .field("singletons", &self.singletons().filled())
            .field("scoped", &scoped.as_ref().map(|cache| cache.filled()))
            .finish()
    }
}

impl Container {
    fn new_root(plan: Arc<ConstructionPlan>) -> Self {
        let len = plan.len();
        Self(Arc::new(ContainerInner {
            plan,
            state: ContainerState::Root {
                singletons: InstanceCache::new(len),
            },
            scoped: RwLock::new(Some(Arc::new(InstanceCache::new(len)))),
        }))
    }

    /// Resolves the service registered for `id`
    pub fn get(&self, id: &ServiceId) -> Result<Instance, ResolveError> {
        let scoped = self.scoped_cache()?;

        if self.0.plan.is_container_id(id) {
            return Ok(Instance::new(self.clone()));
        }

        let slot = self
            .0
            .plan
            .slot_of(id)
            .ok_or_else(|| ResolveError::ServiceNotFound(id.clone()))?;

        Resolution {
            container: self,
            plan: &self.0.plan,
            singletons: self.singletons(),
            scoped: &scoped,
        }
        .resolve(slot)
    }

    /// Resolves the service registered for `id` as `T`
    pub fn resolve<T: Injectable>(&self, id: &ServiceId) -> Result<Arc<T>, ResolveError> {
        self.get(id)?
            .downcast()
            .map_err(|actual_type| ResolveError::DowncastFailed {
                service: id.clone(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Resolves the service registered under the type `T` itself
    pub fn require<T: Injectable>(&self) -> Result<Arc<T>, ResolveError> {
        self.resolve(&ServiceId::of::<T>())
    }

    /// Enters a new scope with its own scoped instances
    ///
    /// Prefer [Container::scoped] or [Container::with_scope], which exit the scope on every path.
    pub fn enter_scope(&self) -> Container {
        let depth = self.depth() + 1;
        tracing::debug!("Entering scope at depth {depth}");

        Container(Arc::new(ContainerInner {
            plan: self.0.plan.clone(),
            state: ContainerState::Scoped {
                root: self.root(),
                parent: self.clone(),
                depth,
            },
            scoped: RwLock::new(Some(Arc::new(InstanceCache::new(self.0.plan.len())))),
        }))
    }

    /// Exits this scope, dropping its scoped instances
    ///
    /// Returns the container the scope was entered from.
    pub fn exit_scope(&self) -> Result<Container, ScopeError> {
        let ContainerState::Scoped { parent, depth, .. } = &self.0.state else {
            return Err(ScopeError::RootScope);
        };

        match self.0.scoped.write().take() {
            Some(_) => {
                tracing::debug!("Exited scope at depth {depth}");
                Ok(parent.clone())
            }
            None => Err(ScopeError::AlreadyExited),
        }
    }

    /// Enters a new scope which is exited once the guard is dropped
    pub fn scoped(&self) -> ScopeGuard {
        ScopeGuard {
            scope: self.enter_scope(),
        }
    }

    /// Runs `f` inside a new scope, exiting it afterwards - also on panic
    pub fn with_scope<R>(&self, f: impl FnOnce(&Container) -> R) -> R {
        let guard = self.scoped();
        f(&guard)
    }

    pub fn is_root(&self) -> bool {
        matches!(self.0.state, ContainerState::Root { .. })
    }

    /// True once [Container::exit_scope] was called on this scope
    pub fn is_exited(&self) -> bool {
        self.0.scoped.read().is_none()
    }

    /// Number of scopes between this container and its root
    pub fn depth(&self) -> usize {
        match &self.0.state {
            ContainerState::Root { .. } => 0,
            ContainerState::Scoped { depth, .. } => *depth,
        }
    }

    /// The container this scope was entered from
    pub fn parent(&self) -> Option<&Container> {
        match &self.0.state {
            ContainerState::Root { .. } => None,
            ContainerState::Scoped { parent, .. } => Some(parent),
        }
    }

    /// The root container owning the singletons
    pub fn root(&self) -> Container {
        match &self.0.state {
            ContainerState::Root { .. } => self.clone(),
            ContainerState::Scoped { root, .. } => root.clone(),
        }
    }

    /// True if both handles are the same container
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn plan(&self) -> &ConstructionPlan {
        &self.0.plan
    }

    fn singletons(&self) -> &InstanceCache {
        match &self.0.state {
            ContainerState::Root { singletons } => singletons,
            ContainerState::Scoped { root, .. } => root.singletons(),
        }
    }

    fn scoped_cache(&self) -> Result<Arc<InstanceCache>, ResolveError> {
        self.0.scoped.read().clone().ok_or(ResolveError::ScopeClosed)
    }
}

/// A single call to [Container::get], walking the plan depth first
struct Resolution<'a> {
    container: &'a Container,
    plan: &'a ConstructionPlan,
    singletons: &'a InstanceCache,
    scoped: &'a InstanceCache,
}
impl Resolution<'_> {
    fn resolve(&self, slot: usize) -> Result<Instance, ResolveError> {
        let step = self.plan.step(slot);
        match step.lifecycle {
            Lifecycle::Singleton => self.singletons.get_or_try_init(slot, || self.construct(step)),
            Lifecycle::Scoped => self.scoped.get_or_try_init(slot, || self.construct(step)),
            Lifecycle::Transient => self.construct(step),
        }
    }

    fn construct(&self, step: &PlanStep) -> Result<Instance, ResolveError> {
        let mut args = Arguments::with_capacity(step.dependencies.len());
        for (parameter, dependency) in &step.dependencies {
            let instance = match dependency {
                DependencyRef::Slot(slot) => self.resolve(*slot)?,
                DependencyRef::Container => Instance::new(self.container.clone()),
            };
            args.insert(parameter.clone(), instance);
        }

        tracing::trace!("Constructing {} service {}", step.lifecycle, step.id);
        step.provider
            .provide(&args)
            .map_err(|error| ResolveError::ProviderFailed {
                service: step.id.clone(),
                error: Arc::new(error),
            })
    }
}

/// A scope which is exited when dropped
///
/// Derefs to the scoped [Container].
pub struct ScopeGuard {
    scope: Container,
}
impl Deref for ScopeGuard {
    type Target = Container;

    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}
impl ScopeGuard {
    /// Exits the scope now, returning the container it was entered from
    pub fn exit(self) -> Result<Container, ScopeError> {
        self.scope.exit_scope()
    }
}
impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // Already exited through `exit` or by hand
        let _ = self.scope.exit_scope();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        descriptor::{DependencyMap, DescriptorStore, ServiceDescriptor},
        generator::PlanGenerator,
        providers::Provider,
        signature::Signature,
    };

    fn container_type(lifecycle: Lifecycle) -> ContainerType {
        let mut store = DescriptorStore::new();
        store.insert(ServiceDescriptor {
            id: ServiceId::named("value"),
            provider: Provider::from_fn(Signature::new(), |_| Ok(String::from("value"))),
            dependencies: DependencyMap::new(),
            lifecycle,
        });
        let plan = PlanGenerator::new("Test", HashSet::from([ServiceId::container()]))
            .generate(&store)
            .unwrap();
        ContainerType::new(plan)
    }

    #[test]
    fn root_is_its_own_scope() {
        let container = container_type(Lifecycle::Scoped).instantiate();
        let id = ServiceId::named("value");

        assert!(container.get(&id).unwrap().ptr_eq(&container.get(&id).unwrap()));
    }

    #[test]
    fn scope_state_machine() {
        let root = container_type(Lifecycle::Scoped).instantiate();
        assert_eq!(root.exit_scope().unwrap_err(), ScopeError::RootScope);

        let first = root.enter_scope();
        let second = first.enter_scope();
        assert_eq!(second.depth(), 2);
        assert!(second.root().ptr_eq(&root));
        assert!(second.parent().unwrap().ptr_eq(&first));

        assert!(second.exit_scope().unwrap().ptr_eq(&first));
        assert_eq!(second.exit_scope().unwrap_err(), ScopeError::AlreadyExited);
        assert!(second.is_exited());
        assert!(matches!(
            second.get(&ServiceId::named("value")),
            Err(ResolveError::ScopeClosed)
        ));

        // The enclosing scope is untouched
        assert!(first.get(&ServiceId::named("value")).is_ok());
    }

    #[test]
    fn guard_exits_on_drop() {
        let root = container_type(Lifecycle::Scoped).instantiate();

        let scope = {
            let guard = root.scoped();
            (*guard).clone()
        };

        assert!(scope.is_exited());
        assert!(!root.is_exited());
    }

    #[test]
    fn guard_exit_returns_parent() {
        let root = container_type(Lifecycle::Transient).instantiate();
        let guard = root.scoped();

        assert!(guard.exit().unwrap().ptr_eq(&root));
    }

    #[test]
    fn container_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
        assert_send_sync::<ContainerType>();
    }
}
