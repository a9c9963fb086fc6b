//! The `Resource` value type.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::{Access, ResourceError};

/// Where the contents of a resource live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Contents held in memory.
    Inline(Bytes),
    /// Contents read from a file on demand.
    File(PathBuf),
}

/// A named, addressable artifact exposed by a block at a given access tier.
///
/// Resources are immutable. Resolvers hand them out as `Arc<Resource>` so that
/// resolving the same name twice yields the same object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    block: String,
    name: String,
    access: Access,
    location: Location,
}

impl Resource {
    /// A resource whose contents are kept in memory.
    pub fn inline(
        block: impl Into<String>,
        name: impl Into<String>,
        access: Access,
        contents: impl Into<Bytes>,
    ) -> Self {
        Self {
            block: block.into(),
            name: name.into(),
            access,
            location: Location::Inline(contents.into()),
        }
    }

    /// A resource backed by a file.
    pub fn file(
        block: impl Into<String>,
        name: impl Into<String>,
        access: Access,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            block: block.into(),
            name: name.into(),
            access,
            location: Location::File(path.into()),
        }
    }

    /// Id of the block declaring this resource.
    pub fn block(&self) -> &str {
        &self.block
    }

    /// Name of the resource, relative to its block.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Inline(_) => None,
        }
    }

    /// Read the full contents of the resource.
    pub fn read(&self) -> Result<Bytes, ResourceError> {
        match &self.location {
            Location::Inline(bytes) => Ok(bytes.clone()),
            Location::File(path) => {
                std::fs::read(path)
                    .map(Bytes::from)
                    .map_err(|source| ResourceError::Read {
                        name: self.name.clone(),
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.block, self.name, self.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_resource_reads_contents() {
        let resource = Resource::inline("auth", "token-service", Access::Public, "tokens");
        assert_eq!(resource.block(), "auth");
        assert_eq!(resource.name(), "token-service");
        assert_eq!(resource.access(), Access::Public);
        assert_eq!(resource.read().unwrap(), "tokens");
        assert!(resource.path().is_none());
    }

    #[test]
    fn file_resource_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, "create table users;").unwrap();

        let resource = Resource::file("db", "schema.sql", Access::Protected, &path);
        assert_eq!(resource.path(), Some(path.as_path()));
        assert_eq!(resource.read().unwrap(), "create table users;");
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let resource = Resource::file("db", "gone", Access::Public, dir.path().join("gone"));
        let err = resource.read().unwrap_err();
        assert!(matches!(err, ResourceError::Read { ref name, .. } if name == "gone"));
    }

    #[test]
    fn display_names_block_and_tier() {
        let resource = Resource::inline("site", "index.html", Access::Private, "");
        assert_eq!(format!("{}", resource), "site:index.html (private)");
    }
}
