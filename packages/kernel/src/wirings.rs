//! Deployed wirings: one per deployed block instance.
//!
//! A [`DeployedWirings`] is what a block instance sees of the world once it is
//! deployed:
//! - its own private and protected resources, and the protected resources of
//!   every block it extends
//! - the public resources of the blocks it is wired to, addressed as
//!   `<wiring>:<name>`
//! - the components of the blocks it is wired to, as [`Wire`]s
//!
//! Protected and private resources of a wired block are never visible
//! through a wiring: cross-block resolution goes through the target's public
//! resolver only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use blockwire_resolution::{Access, CompoundResolver, Resolver, Resource, SharedResolver};

use crate::composer::Composer;
use crate::deployer::KernelDeployer;
use crate::error::{DeploymentError, WiringError};
use crate::instance::Instance;
use crate::logging::Logger;
use crate::wire::{ProxyWire, Role, Wire, Wirings, WiringsWrapper};

/// The deployed form of a block instance.
pub struct DeployedWirings {
    instance: Instance,
    deployer: Weak<KernelDeployer>,
    this: Weak<DeployedWirings>,
    composer: Option<Arc<dyn Composer>>,
    prefixes: BTreeMap<String, String>,
    priresolver: Arc<CompoundResolver>,
    pubresolver: Arc<CompoundResolver>,
    logger: Logger,
}

impl DeployedWirings {
    /// Build the deployed form of `instance`.
    ///
    /// The composer is created through the deployer's registry, the routing
    /// table is built from the declared wirings, and both resolvers are
    /// populated by walking the extension chain. Nothing is registered with
    /// the deployer; see [`KernelDeployer::deploy`].
    pub fn new(
        instance: Instance,
        deployer: &Arc<KernelDeployer>,
        parent: &Logger,
    ) -> Result<Arc<Self>, DeploymentError> {
        let logger = parent.sub_logger(instance.name());
        let block = instance.block().clone();

        let mut composer = deployer
            .registry()
            .build(instance.name(), &block.descriptor().composition())?;
        if let Some(logging) = composer.as_mut().and_then(|c| c.logging_mut()) {
            logging.logger(logger.clone());
        }

        let prefixes = Self::routing_table(&instance)?;

        let lineage = block.lineage(deployer.config().max_extension_depth)?;
        let mut priresolver = CompoundResolver::new();
        let mut pubresolver = CompoundResolver::new();
        priresolver.add(block.resolver(Access::Private).clone());
        for ancestor in &lineage {
            priresolver.add(ancestor.resolver(Access::Protected).clone());
            pubresolver.add(ancestor.resolver(Access::Public).clone());
        }

        logger.debug(format_args!(
            "deployed block \"{}\" ({} wirings, {} blocks in lineage, {})",
            block.id(),
            prefixes.len(),
            lineage.len(),
            if composer.is_some() {
                "provides components"
            } else {
                "no components"
            }
        ));

        let composer: Option<Arc<dyn Composer>> = composer.map(Arc::from);
        Ok(Arc::new_cyclic(|this| Self {
            instance,
            deployer: Arc::downgrade(deployer),
            this: this.clone(),
            composer,
            prefixes,
            priresolver: Arc::new(priresolver),
            pubresolver: Arc::new(pubresolver),
            logger,
        }))
    }

    /// Map `"<wiring>:"` to `wiring`, rejecting names that would route
    /// ambiguously.
    fn routing_table(instance: &Instance) -> Result<BTreeMap<String, String>, DeploymentError> {
        let prefixes: BTreeMap<String, String> = instance
            .wirings()
            .map(|name| (format!("{}:", name), name.to_string()))
            .collect();

        for (prefix, wiring) in &prefixes {
            if let Some((_, shadowed)) = prefixes
                .iter()
                .find(|(other, _)| *other != prefix && other.starts_with(prefix.as_str()))
            {
                return Err(DeploymentError::OverlappingWirings {
                    instance: instance.name().to_string(),
                    wiring: wiring.clone(),
                    shadowed: shadowed.clone(),
                });
            }
        }

        Ok(prefixes)
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn composer(&self) -> Option<&Arc<dyn Composer>> {
        self.composer.as_ref()
    }

    pub fn provides_components(&self) -> bool {
        self.composer.is_some()
    }

    /// Routing prefixes, one per declared wiring.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.keys().map(String::as_str)
    }

    /// Own private resolver, then own and inherited protected resolvers.
    pub fn private_resolver(&self) -> &CompoundResolver {
        &self.priresolver
    }

    /// Own and inherited public resolvers: what wired blocks can see.
    pub fn public_resolver(&self) -> &CompoundResolver {
        &self.pubresolver
    }

    /// A restricted view of this block.
    pub fn wrapper(&self) -> WiringsWrapper {
        WiringsWrapper::new(self.instance.name(), self.this.clone())
    }

    fn target(&self, wiring: &str) -> Option<Arc<DeployedWirings>> {
        let id = self.instance.wiring(wiring)?;
        self.deployer.upgrade()?.lookup(id)
    }

    /// Resolve a resource visible to this block.
    ///
    /// Names starting with `<wiring>:` resolve the remainder against the
    /// public resources of the wired block. Other names resolve against this
    /// block's private and protected resources.
    pub fn resolve(&self, name: &str) -> Result<Option<Arc<Resource>>, WiringError> {
        if name.is_empty() {
            return Ok(None);
        }

        let routed = self
            .prefixes
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix.as_str()));

        match routed {
            Some((prefix, wiring)) => {
                let target = self.target(wiring).ok_or_else(|| {
                    self.logger
                        .error(format_args!("wiring \"{}\" is not deployed", wiring));
                    WiringError::Undeployed {
                        instance: self.instance.name().to_string(),
                        wiring: wiring.clone(),
                    }
                })?;
                Ok(target.pubresolver.resolve(&name[prefix.len()..]))
            }
            None => Ok(self.priresolver.resolve(name)),
        }
    }

    /// Look up the component of wiring `name` as role `R`.
    pub fn lookup<R: ?Sized + 'static>(&self, name: &str) -> Result<Wire<R>, WiringError> {
        self.wire(Role::of::<R>(), name).map(ProxyWire::into_wire)
    }

    /// Untyped form of [`DeployedWirings::lookup`].
    pub fn wire(&self, role: Role, name: &str) -> Result<ProxyWire, WiringError> {
        if name.is_empty() {
            return Err(WiringError::NoName);
        }

        let target = self
            .target(name)
            .ok_or_else(|| WiringError::UnknownWiring {
                instance: self.instance.name().to_string(),
                wiring: name.to_string(),
            })?;
        target.new_wire(role, self.pubresolver.clone())
    }

    /// Create a wire to this block's component for a block whose public
    /// resources are reachable through `resolver`.
    pub(crate) fn new_wire(
        &self,
        role: Role,
        resolver: SharedResolver,
    ) -> Result<ProxyWire, WiringError> {
        let composer = self
            .composer
            .as_ref()
            .ok_or_else(|| WiringError::NoComponents {
                instance: self.instance.name().to_string(),
            })?;

        if !composer.provides(&role) {
            return Err(WiringError::UnsupportedRole {
                instance: self.instance.name().to_string(),
                role,
            });
        }

        Ok(ProxyWire::new(
            composer.clone(),
            role,
            self.wrapper(),
            resolver,
            self.logger.clone(),
        ))
    }

    /// Contextualize and configure the composer, then initialize it if it
    /// has a lifecycle.
    pub fn init(&self) -> Result<(), WiringError> {
        if let Some(composer) = &self.composer {
            composer.contextualize(self.wrapper())?;
            composer.configure(self.instance.configuration())?;
            if let Some(lifecycle) = composer.lifecycle() {
                lifecycle.init()?;
            }
        }
        Ok(())
    }

    pub fn start(&self) {
        if let Some(lifecycle) = self.composer.as_ref().and_then(|c| c.lifecycle()) {
            lifecycle.start();
        }
    }

    pub fn destroy(&self) -> Result<(), WiringError> {
        if let Some(lifecycle) = self.composer.as_ref().and_then(|c| c.lifecycle()) {
            lifecycle.destroy()?;
        }
        Ok(())
    }
}

impl Wirings for DeployedWirings {
    fn resolve(&self, name: &str) -> Result<Option<Arc<Resource>>, WiringError> {
        DeployedWirings::resolve(self, name)
    }

    fn wire(&self, role: Role, name: &str) -> Result<ProxyWire, WiringError> {
        DeployedWirings::wire(self, role, name)
    }
}

impl fmt::Debug for DeployedWirings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployedWirings")
            .field("instance", &self.instance)
            .field("prefixes", &self.prefixes)
            .field("provides_components", &self.composer.is_some())
            .finish()
    }
}
