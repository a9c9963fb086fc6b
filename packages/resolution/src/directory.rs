//! On-disk resolver.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Access, ResourceError, Resolver, Resource};

/// A resolver mapping names to files below a root directory.
///
/// Names use `/` as separator. Names with empty, `.` or `..` components never
/// resolve, so a name can not escape the root. Only regular files resolve.
///
/// The `Resource` created for a name is remembered, so resolving the same
/// name twice returns the same `Arc`.
pub struct DirectoryResolver {
    block: String,
    access: Access,
    root: PathBuf,
    seen: RwLock<HashMap<String, Arc<Resource>>>,
}

impl DirectoryResolver {
    /// Create a resolver rooted at `root`, which must be an existing directory.
    pub fn new(
        block: impl Into<String>,
        access: Access,
        root: impl Into<PathBuf>,
    ) -> Result<Self, ResourceError> {
        let root = root.into();
        let attr = std::fs::metadata(&root).map_err(|source| ResourceError::RootInvalid {
            path: root.clone(),
            source,
        })?;

        if !attr.is_dir() {
            return Err(ResourceError::RootInvalid {
                path: root,
                source: std::io::Error::other("root path must be a directory"),
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(Self {
                block: block.into(),
                access,
                root,
                seen: RwLock::new(HashMap::new()),
            }),
            Err(source) => Err(ResourceError::RootInvalid { path: root, source }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for component in name.split('/') {
            if component.is_empty()
                || component == "."
                || component == ".."
                || component.contains('\\')
            {
                return None;
            }
            path.push(component);
        }
        Some(path)
    }
}

impl Resolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Option<Arc<Resource>> {
        if let Some(found) = self
            .seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(found.clone());
        }

        let path = self.file_path(name)?;
        if !path.is_file() {
            return None;
        }

        tracing::trace!(
            block = %self.block,
            access = %self.access,
            resource = name,
            "resolved {}",
            path.display()
        );
        let mut seen = self.seen.write().unwrap_or_else(PoisonError::into_inner);
        let resource = seen
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Resource::file(&self.block, name, self.access, path)));
        Some(resource.clone())
    }
}

impl std::fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryResolver")
            .field("block", &self.block)
            .field("access", &self.access)
            .field("root", &self.root)
            .finish()
    }
}
