//! Blockwire resolution layer.
//!
//! Every block exposes its resources through three access tiers:
//! - `Private`: visible to the block itself only
//! - `Protected`: visible to the block and to blocks extending it
//! - `Public`: visible to any block wired to it
//!
//! A [`Resolver`] maps a resource name to a [`Resource`], returning `None` on a
//! miss. Resolvers are stateless lookups from the caller's point of view, so
//! resolving the same name twice hands back the same `Arc<Resource>`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use blockwire_resolution::{Access, CompoundResolver, Resolver, Resource, TableResolver};
//!
//! let mut own = TableResolver::new();
//! own.insert(Resource::inline("app", "index", Access::Public, "hello"));
//!
//! let mut compound = CompoundResolver::new();
//! compound.add(Arc::new(own));
//!
//! let found = compound.resolve("index").unwrap();
//! assert_eq!(found.read().unwrap(), "hello");
//! assert!(compound.resolve("missing").is_none());
//! ```

pub use bytes::Bytes;

mod access;
mod directory;
mod error;
mod resolver;
mod resource;
mod table;

pub use access::{Access, Tiers};
pub use directory::DirectoryResolver;
pub use error::ResourceError;
pub use resolver::{CompoundResolver, EmptyResolver, Resolver, SharedResolver};
pub use resource::{Location, Resource};
pub use table::TableResolver;
