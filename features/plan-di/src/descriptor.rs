use std::{borrow::Cow, collections::HashMap};

use crate::{
    providers::Provider,
    types::{Lifecycle, ServiceId},
};

/// Parameter name to required service, in declaration order
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    entries: Vec<(Cow<'static, str>, ServiceId)>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `id`, replacing an earlier binding of the same name
    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, id: ServiceId) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, bound)) => *bound = id,
            None => self.entries.push((name, id)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceId> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, id)| id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Cow<'static, str>, ServiceId)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Cow<'static, str>, ServiceId)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (Cow<'static, str>, ServiceId)>>(iter: I) -> Self {
        let mut map = DependencyMap::new();
        for (name, id) in iter {
            map.insert(name, id);
        }
        map
    }
}

/// Everything known about one registered service
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub id: ServiceId,
    pub provider: Provider,
    pub dependencies: DependencyMap,
    pub lifecycle: Lifecycle,
}

/// Registered descriptors, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct DescriptorStore {
    order: Vec<ServiceId>,
    descriptors: HashMap<ServiceId, ServiceDescriptor>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, returning the one it replaced
    ///
    /// A replaced service keeps its original registration position.
    pub fn insert(&mut self, descriptor: ServiceDescriptor) -> Option<ServiceDescriptor> {
        let id = descriptor.id.clone();
        let replaced = self.descriptors.insert(id.clone(), descriptor);
        if replaced.is_none() {
            self.order.push(id);
        }
        replaced
    }

    pub fn get(&self, id: &ServiceId) -> Option<&ServiceDescriptor> {
        self.descriptors.get(id)
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.descriptors.contains_key(id)
    }

    /// All descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.order.iter().filter_map(|id| self.descriptors.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &'static str, lifecycle: Lifecycle) -> ServiceDescriptor {
        ServiceDescriptor {
            id: ServiceId::named(name),
            provider: Provider::instance(name),
            dependencies: DependencyMap::new(),
            lifecycle,
        }
    }

    #[test]
    fn overwrite_keeps_registration_position() {
        let mut store = DescriptorStore::new();
        store.insert(descriptor("a", Lifecycle::Transient));
        store.insert(descriptor("b", Lifecycle::Transient));
        let replaced = store.insert(descriptor("a", Lifecycle::Singleton));

        assert_eq!(replaced.map(|d| d.lifecycle), Some(Lifecycle::Transient));
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get(&ServiceId::named("a")).map(|d| d.lifecycle),
            Some(Lifecycle::Singleton)
        );

        let order: Vec<_> = store.iter().map(|d| (d.id.to_string(), d.lifecycle)).collect();
        assert_eq!(
            order,
            [
                ("\"a\"".to_string(), Lifecycle::Singleton),
                ("\"b\"".to_string(), Lifecycle::Transient),
            ]
        );
    }

    #[test]
    fn dependency_map_rebinds_names() {
        let mut map = DependencyMap::new();
        map.insert("config", ServiceId::named("first"));
        map.insert("cache", ServiceId::named("cache"));
        map.insert("config", ServiceId::named("second"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("config"), Some(&ServiceId::named("second")));
        assert_eq!(map.iter().next().map(|(name, _)| name.clone()), Some("config".into()));
    }
}
