//! The kernel deployer: registry of deployed block instances.
//!
//! The deployer is responsible for:
//! - Turning instances into [`DeployedWirings`] and registering them
//! - Looking deployed instances up while blocks resolve and wire
//! - Driving block lifecycles in dependency order
//!
//! Registration happens on one thread during deployment; lookups may come
//! from any number of threads afterwards.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::KernelConfig;
use crate::error::DeploymentError;
use crate::instance::{Instance, InstanceId};
use crate::logging::Logger;
use crate::registry::ComposerRegistry;
use crate::wirings::DeployedWirings;

/// Lifecycle state of a deployed block instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Registered, composer created.
    Deployed,
    /// Composer contextualized, configured and initialized.
    Initialized,
    /// Started.
    Started,
    /// Initialization failed.
    Failed,
}

struct Registered {
    wirings: Arc<DeployedWirings>,
    state: BlockState,
}

#[derive(Default)]
struct Deployments {
    blocks: BTreeMap<InstanceId, Registered>,
    /// Instances in the order they were initialized.
    initialized: Vec<InstanceId>,
}

/// Registry mapping deployed instances to their [`DeployedWirings`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use blockwire_kernel::{Block, BlockState, Descriptor, Instance, KernelDeployer};
///
/// let deployer = KernelDeployer::with_defaults();
/// let auth = Instance::new("auth", Arc::new(Block::new(Descriptor::new("auth"))));
/// let app = Instance::new("app", Arc::new(Block::new(Descriptor::new("app"))))
///     .wire("auth", &auth)
///     .unwrap();
/// let app_id = app.id();
///
/// deployer.deploy_all(vec![app, auth]).unwrap();
/// assert_eq!(deployer.state(&app_id), Some(BlockState::Started));
///
/// deployer.shutdown().unwrap();
/// assert!(deployer.is_empty());
/// ```
pub struct KernelDeployer {
    config: KernelConfig,
    registry: ComposerRegistry,
    logger: Logger,
    deployments: RwLock<Deployments>,
}

impl KernelDeployer {
    pub fn new(config: KernelConfig, registry: ComposerRegistry, logger: Logger) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry,
            logger,
            deployments: RwLock::new(Deployments::default()),
        })
    }

    /// A deployer with default settings and the given composer registry.
    pub fn with_registry(registry: ComposerRegistry) -> Arc<Self> {
        Self::new(KernelConfig::default(), registry, Logger::default())
    }

    /// A deployer with default settings and only the built-in composers.
    pub fn with_defaults() -> Arc<Self> {
        Self::with_registry(ComposerRegistry::new())
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComposerRegistry {
        &self.registry
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The deployed form of instance `id`.
    pub fn lookup(&self, id: &InstanceId) -> Option<Arc<DeployedWirings>> {
        self.read().blocks.get(id).map(|r| r.wirings.clone())
    }

    /// The deployed instance called `name`.
    pub fn find(&self, name: &str) -> Option<Arc<DeployedWirings>> {
        self.read()
            .blocks
            .values()
            .find(|r| r.wirings.name() == name)
            .map(|r| r.wirings.clone())
    }

    pub fn state(&self, id: &InstanceId) -> Option<BlockState> {
        self.read().blocks.get(id).map(|r| r.state)
    }

    /// Ids of all deployed instances.
    pub fn instances(&self) -> Vec<InstanceId> {
        self.read().blocks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().blocks.is_empty()
    }

    /// Deploy and register one instance. Its lifecycle is not started.
    pub fn deploy(
        self: &Arc<Self>,
        instance: Instance,
    ) -> Result<Arc<DeployedWirings>, DeploymentError> {
        let id = instance.id();
        if self.read().blocks.contains_key(&id) {
            return Err(DeploymentError::AlreadyDeployed {
                instance: instance.name().to_string(),
            });
        }

        let wirings = DeployedWirings::new(instance, self, &self.logger)?;

        let mut deployments = self.write();
        if deployments.blocks.contains_key(&id) {
            return Err(DeploymentError::AlreadyDeployed {
                instance: wirings.name().to_string(),
            });
        }
        deployments.blocks.insert(
            id,
            Registered {
                wirings: wirings.clone(),
                state: BlockState::Deployed,
            },
        );
        Ok(wirings)
    }

    /// Initialize a deployed instance.
    pub fn initialize(&self, id: &InstanceId) -> Result<(), DeploymentError> {
        let wirings = self.deployed(id)?;
        match wirings.init() {
            Ok(()) => {
                let mut deployments = self.write();
                if let Some(registered) = deployments.blocks.get_mut(id) {
                    registered.state = BlockState::Initialized;
                }
                deployments.initialized.push(*id);
                Ok(())
            }
            Err(source) => {
                self.set_state(id, BlockState::Failed);
                Err(DeploymentError::Lifecycle {
                    instance: wirings.name().to_string(),
                    phase: "initialize",
                    source,
                })
            }
        }
    }

    /// Start an initialized instance.
    pub fn start(&self, id: &InstanceId) -> Result<(), DeploymentError> {
        let wirings = self.deployed(id)?;
        wirings.start();
        self.set_state(id, BlockState::Started);
        Ok(())
    }

    /// Destroy an instance and remove it from the registry.
    ///
    /// Only instances that were initialized get their lifecycle destroyed.
    pub fn destroy(&self, id: &InstanceId) -> Result<(), DeploymentError> {
        let registered = {
            let mut deployments = self.write();
            deployments.initialized.retain(|other| other != id);
            deployments.blocks.remove(id)
        };
        let registered = registered.ok_or_else(|| DeploymentError::NotDeployed {
            instance: id.to_string(),
        })?;

        if matches!(
            registered.state,
            BlockState::Initialized | BlockState::Started
        ) {
            registered
                .wirings
                .destroy()
                .map_err(|source| DeploymentError::Lifecycle {
                    instance: registered.wirings.name().to_string(),
                    phase: "destroy",
                    source,
                })?;
        }
        self.logger
            .debug(format_args!("destroyed \"{}\"", registered.wirings.name()));
        Ok(())
    }

    /// Deploy, initialize and start a set of instances.
    ///
    /// Instances are deployed so that the targets of their wirings come
    /// first. If any step fails, every instance of the batch that made it
    /// into the registry is destroyed again, newest first.
    pub fn deploy_all(
        self: &Arc<Self>,
        instances: Vec<Instance>,
    ) -> Result<Vec<Arc<DeployedWirings>>, DeploymentError> {
        let (ordered, cyclic) = dependency_order(instances);
        if cyclic {
            self.logger
                .warn("wiring cycle detected, deploying the rest in declaration order");
        }

        let mut deployed = Vec::with_capacity(ordered.len());
        for instance in ordered {
            match self.deploy(instance) {
                Ok(wirings) => deployed.push(wirings),
                Err(e) => {
                    self.rollback(&deployed);
                    return Err(e);
                }
            }
        }

        for step in [Self::initialize, Self::start] {
            for wirings in &deployed {
                if let Err(e) = step(self, &wirings.instance().id()) {
                    self.logger.error(&e);
                    self.rollback(&deployed);
                    return Err(e);
                }
            }
        }

        self.logger
            .info(format_args!("started {} block instances", deployed.len()));
        Ok(deployed)
    }

    /// Destroy every deployed instance, in reverse initialization order.
    ///
    /// All instances are destroyed even if some fail; the first failure is
    /// returned.
    pub fn shutdown(&self) -> Result<(), DeploymentError> {
        let order: Vec<InstanceId> = {
            let deployments = self.read();
            let mut order: Vec<InstanceId> =
                deployments.initialized.iter().rev().copied().collect();
            order.extend(
                deployments
                    .blocks
                    .keys()
                    .filter(|id| !deployments.initialized.contains(id)),
            );
            order
        };

        let mut first = None;
        for id in order {
            if let Err(e) = self.destroy(&id) {
                self.logger.error(&e);
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn rollback(&self, deployed: &[Arc<DeployedWirings>]) {
        for wirings in deployed.iter().rev() {
            if let Err(e) = self.destroy(&wirings.instance().id()) {
                self.logger.warn(format_args!("rollback: {}", e));
            }
        }
    }

    fn deployed(&self, id: &InstanceId) -> Result<Arc<DeployedWirings>, DeploymentError> {
        self.lookup(id).ok_or_else(|| DeploymentError::NotDeployed {
            instance: id.to_string(),
        })
    }

    fn set_state(&self, id: &InstanceId, state: BlockState) {
        if let Some(registered) = self.write().blocks.get_mut(id) {
            registered.state = state;
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Deployments> {
        self.deployments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Deployments> {
        self.deployments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for KernelDeployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelDeployer")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("deployed", &self.len())
            .finish()
    }
}

/// Order instances so that wiring targets inside the batch come before the
/// instances wired to them. Instances caught in a cycle keep their
/// declaration order at the end; the flag reports whether that happened.
fn dependency_order(instances: Vec<Instance>) -> (Vec<Instance>, bool) {
    let batch: HashSet<InstanceId> = instances.iter().map(Instance::id).collect();
    let mut placed = HashSet::new();
    let mut ordered = Vec::with_capacity(instances.len());
    let mut pending: Vec<Option<Instance>> = instances.into_iter().map(Some).collect();

    let ready = |instance: &Instance, placed: &HashSet<InstanceId>| {
        instance
            .wirings()
            .filter_map(|name| instance.wiring(name))
            .all(|target| {
                *target == instance.id() || !batch.contains(target) || placed.contains(target)
            })
    };

    loop {
        let mut progressed = false;
        for slot in pending.iter_mut() {
            if slot.as_ref().is_some_and(|instance| ready(instance, &placed)) {
                if let Some(instance) = slot.take() {
                    placed.insert(instance.id());
                    ordered.push(instance);
                    progressed = true;
                }
            }
        }
        if !progressed {
            break;
        }
    }

    let stuck: Vec<Instance> = pending.into_iter().flatten().collect();
    let cyclic = !stuck.is_empty();
    ordered.extend(stuck);
    (ordered, cyclic)
}
