//! In-memory resolver.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Resolver, Resource};

/// A resolver over a fixed table of resources.
///
/// # Example
///
/// ```rust
/// use blockwire_resolution::{Access, Resolver, Resource, TableResolver};
///
/// let mut table = TableResolver::new();
/// table.insert(Resource::inline("auth", "token-service", Access::Public, "..."));
///
/// assert!(table.resolve("token-service").is_some());
/// assert!(table.resolve("session-store").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    resources: HashMap<String, Arc<Resource>>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource under its own name, returning the one it replaces.
    pub fn insert(&mut self, resource: Resource) -> Option<Arc<Resource>> {
        self.resources
            .insert(resource.name().to_string(), Arc::new(resource))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Names of all resources in the table, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}

impl FromIterator<Resource> for TableResolver {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut table = TableResolver::new();
        for resource in iter {
            table.insert(resource);
        }
        table
    }
}

impl Resolver for TableResolver {
    fn resolve(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Access;

    #[test]
    fn insert_replaces_same_name() {
        let mut table = TableResolver::new();
        assert!(table
            .insert(Resource::inline("b", "a", Access::Public, "1"))
            .is_none());
        let old = table
            .insert(Resource::inline("b", "a", Access::Public, "2"))
            .unwrap();
        assert_eq!(old.read().unwrap(), "1");
        assert_eq!(table.resolve("a").unwrap().read().unwrap(), "2");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn collect_from_resources() {
        let table: TableResolver = ["x", "y"]
            .into_iter()
            .map(|name| Resource::inline("b", name, Access::Private, name))
            .collect();
        let mut names: Vec<_> = table.names().collect();
        names.sort();
        assert_eq!(names, vec!["x", "y"]);
    }
}
