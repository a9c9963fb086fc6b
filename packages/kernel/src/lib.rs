//! Blockwire kernel: deployed block instances and the wiring between them.
//!
//! A [`Block`] bundles resources in three access tiers and optionally a
//! composer that hands out components. An [`Instance`] is a named,
//! configured use of a block, wired by name to other instances. The
//! [`KernelDeployer`] turns instances into [`DeployedWirings`], which is how
//! a block resolves resources and reaches the components of the blocks it
//! is wired to:
//!
//! - `resolve("style.css")` looks in the block's own private and protected
//!   resources, then in the protected resources of the blocks it extends
//! - `resolve("auth:login.html")` looks in the public resources of the
//!   block wired as `auth`
//! - `lookup::<dyn TokenService>("auth")` returns a [`Wire`] to the
//!   component of the block wired as `auth`
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use blockwire_kernel::{
//!     Block, ComponentClass, ComposerRegistry, Descriptor, Instance, KernelDeployer,
//! };
//! use blockwire_kernel::resolution::{Access, Resource, TableResolver};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! let mut registry = ComposerRegistry::new();
//! registry.register_class(
//!     ComponentClass::builder("English", |_| Ok(English))
//!         .provides(|c| c as Arc<dyn Greeter>)
//!         .build(),
//! );
//!
//! let mut public = TableResolver::new();
//! public.insert(Resource::inline("greeter", "motd", Access::Public, "welcome"));
//! let greeter = Instance::new(
//!     "greeter",
//!     Arc::new(
//!         Block::new(Descriptor::new("greeter").with_class("English"))
//!             .with_resolver(Access::Public, Arc::new(public)),
//!     ),
//! );
//! let app = Instance::new("app", Arc::new(Block::new(Descriptor::new("app"))))
//!     .wire("greeting", &greeter)
//!     .unwrap();
//!
//! let deployer = KernelDeployer::with_registry(registry);
//! let deployed = deployer.deploy_all(vec![greeter, app]).unwrap();
//! let app = &deployed[1];
//!
//! let motd = app.resolve("greeting:motd").unwrap().unwrap();
//! assert_eq!(motd.read().unwrap(), "welcome");
//!
//! let wire = app.lookup::<dyn Greeter>("greeting").unwrap();
//! assert_eq!(wire.get().unwrap().greet(), "hello");
//! ```

pub use blockwire_resolution as resolution;

mod block;
mod component;
mod composer;
mod config;
mod deployer;
mod descriptor;
mod error;
mod instance;
mod logging;
mod registry;
mod wire;
mod wirings;

pub use block::Block;
pub use component::{
    Component, ComponentClass, ComponentClassBuilder, ComponentContext, ComponentObject,
};
pub use composer::{Composer, Lifecycle, SimpleComposer, SingletonComposer};
pub use config::{Configuration, KernelConfig};
pub use deployer::{BlockState, KernelDeployer};
pub use descriptor::{Composition, Descriptor};
pub use error::{BoxError, ComposerError, ComposerPiece, DeploymentError, WiringError};
pub use instance::{Instance, InstanceId};
pub use logging::{Logger, Logging, ROOT_LOGGER};
pub use registry::{ComposerRegistry, DEFAULT_COMPOSER, SINGLETON_COMPOSER};
pub use wire::{ProxyWire, Role, Wire, Wirings, WiringsExt, WiringsWrapper};
pub use wirings::DeployedWirings;
