//! The `Resolver` trait and its compound form.

use std::sync::Arc;

use crate::Resource;

/// Resolve resource names to resources.
///
/// Resolution never fails: a name that does not resolve yields `None`.
///
/// # Object Safety
///
/// This trait is object-safe: resolvers are usually shared as
/// [`SharedResolver`].
pub trait Resolver: Send + Sync {
    /// Resolve `name`.
    ///
    /// # Returns
    ///
    /// * `None` - No resource with this name is visible through the resolver.
    /// * `Some(resource)` - The resource.
    fn resolve(&self, name: &str) -> Option<Arc<Resource>>;
}

/// A resolver shared between blocks.
pub type SharedResolver = Arc<dyn Resolver>;

impl<T: Resolver + ?Sized> Resolver for Arc<T> {
    fn resolve(&self, name: &str) -> Option<Arc<Resource>> {
        self.as_ref().resolve(name)
    }
}

impl<T: Resolver + ?Sized> Resolver for Box<T> {
    fn resolve(&self, name: &str) -> Option<Arc<Resource>> {
        self.as_ref().resolve(name)
    }
}

impl<T: Resolver + ?Sized> Resolver for &T {
    fn resolve(&self, name: &str) -> Option<Arc<Resource>> {
        (*self).resolve(name)
    }
}

/// A resolver that never resolves anything.
///
/// Stands in for a tier a block declares no resources for.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn resolve(&self, _name: &str) -> Option<Arc<Resource>> {
        None
    }
}

/// An ordered aggregation of resolvers.
///
/// Members are queried in the order they were added; the first one that
/// resolves a name wins, so addition order is precedence.
#[derive(Clone, Default)]
pub struct CompoundResolver {
    members: Vec<SharedResolver>,
}

impl CompoundResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member resolver with the lowest precedence so far.
    pub fn add(&mut self, resolver: SharedResolver) {
        self.members.push(resolver);
    }

    /// Number of member resolvers.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member resolvers, highest precedence first.
    pub fn members(&self) -> impl Iterator<Item = &SharedResolver> {
        self.members.iter()
    }
}

impl Extend<SharedResolver> for CompoundResolver {
    fn extend<I: IntoIterator<Item = SharedResolver>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl FromIterator<SharedResolver> for CompoundResolver {
    fn from_iter<I: IntoIterator<Item = SharedResolver>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for CompoundResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundResolver")
            .field("members", &self.members.len())
            .finish()
    }
}

impl Resolver for CompoundResolver {
    fn resolve(&self, name: &str) -> Option<Arc<Resource>> {
        self.members.iter().find_map(|member| member.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Access, TableResolver};

    fn table(block: &str, names: &[&str]) -> SharedResolver {
        let mut table = TableResolver::new();
        for name in names {
            table.insert(Resource::inline(block, *name, Access::Public, name.to_string()));
        }
        Arc::new(table)
    }

    #[test]
    fn first_match_wins() {
        let mut compound = CompoundResolver::new();
        compound.add(table("first", &["shared", "only-first"]));
        compound.add(table("second", &["shared", "only-second"]));

        assert_eq!(compound.resolve("shared").unwrap().block(), "first");
        assert_eq!(compound.resolve("only-second").unwrap().block(), "second");
        assert!(compound.resolve("nowhere").is_none());
    }

    #[test]
    fn empty_compound_resolves_nothing() {
        let compound = CompoundResolver::new();
        assert!(compound.is_empty());
        assert!(compound.resolve("anything").is_none());
    }

    #[test]
    fn nested_compounds_keep_order() {
        let inner: CompoundResolver = vec![table("inner", &["x"])].into_iter().collect();
        let mut outer = CompoundResolver::new();
        outer.add(Arc::new(inner));
        outer.add(table("outer", &["x", "y"]));

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.resolve("x").unwrap().block(), "inner");
        assert_eq!(outer.resolve("y").unwrap().block(), "outer");
    }

    #[test]
    fn repeated_resolution_returns_same_resource() {
        let mut compound = CompoundResolver::new();
        compound.add(table("auth", &["token-service"]));

        let first = compound.resolve("token-service").unwrap();
        let second = compound.resolve("token-service").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn empty_resolver_is_object_safe() {
        let resolver: SharedResolver = Arc::new(EmptyResolver);
        assert!(resolver.resolve("x").is_none());
    }
}
