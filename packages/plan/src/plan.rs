//! Deployment plans.
//!
//! A plan describes, in JSON, the blocks to load and the instances to deploy:
//!
//! ```json
//! {
//!   "kernel": { "max_extension_depth": 16 },
//!   "blocks": [
//!     { "id": "auth", "composer": "singleton", "class": "Tokens",
//!       "resources": { "public": { "login.html": "<form/>" } },
//!       "directories": { "protected": "auth/templates" } },
//!     { "id": "app" }
//!   ],
//!   "instances": [
//!     { "name": "auth", "block": "auth", "configuration": { "issuer": "acme" } },
//!     { "name": "app", "block": "app", "wirings": { "auth": "auth" } }
//!   ]
//! }
//! ```
//!
//! Directories are relative to the plan file when the plan is read with
//! [`DeploymentPlan::from_path`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blockwire_kernel::{
    Block, ComposerRegistry, Configuration, Descriptor, Instance, InstanceId, KernelConfig,
    KernelDeployer, Logger,
};
use blockwire_resolution::{
    Access, CompoundResolver, DirectoryResolver, EmptyResolver, Resource, SharedResolver,
    TableResolver,
};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Inline resources of a block, per access tier. Names map to contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierResources {
    pub private: BTreeMap<String, String>,
    pub protected: BTreeMap<String, String>,
    pub public: BTreeMap<String, String>,
}

impl TierResources {
    pub fn get(&self, access: Access) -> &BTreeMap<String, String> {
        match access {
            Access::Private => &self.private,
            Access::Protected => &self.protected,
            Access::Public => &self.public,
        }
    }
}

/// Resource directories of a block, per access tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierDirectories {
    pub private: Option<PathBuf>,
    pub protected: Option<PathBuf>,
    pub public: Option<PathBuf>,
}

impl TierDirectories {
    pub fn get(&self, access: Access) -> Option<&PathBuf> {
        match access {
            Access::Private => self.private.as_ref(),
            Access::Protected => self.protected.as_ref(),
            Access::Public => self.public.as_ref(),
        }
    }
}

/// A block as written in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    #[serde(flatten)]
    pub descriptor: Descriptor,

    #[serde(default)]
    pub resources: TierResources,

    #[serde(default)]
    pub directories: TierDirectories,
}

/// An instance as written in a plan. Wirings map to instance names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub block: String,

    #[serde(default)]
    pub wirings: BTreeMap<String, String>,

    #[serde(default)]
    pub configuration: Configuration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    #[serde(default)]
    pub kernel: KernelConfig,

    #[serde(default)]
    pub blocks: Vec<BlockSpec>,

    #[serde(default)]
    pub instances: Vec<InstanceSpec>,

    /// Directory relative resource directories are resolved against.
    #[serde(skip)]
    base: Option<PathBuf>,
}

impl DeploymentPlan {
    pub fn from_json_str(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a plan file. Resource directories are taken relative to it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut plan = Self::from_json_str(&json)?;
        plan.base = path.parent().map(Path::to_path_buf);
        Ok(plan)
    }

    pub fn kernel(&self) -> &KernelConfig {
        &self.kernel
    }

    /// Build every block of the plan, linked through `extends`.
    pub fn blocks(&self) -> Result<BTreeMap<String, Arc<Block>>, PlanError> {
        let mut specs: BTreeMap<&str, &BlockSpec> = BTreeMap::new();
        for spec in &self.blocks {
            if specs.insert(spec.descriptor.id.as_str(), spec).is_some() {
                return Err(PlanError::Duplicate {
                    kind: "block",
                    name: spec.descriptor.id.clone(),
                });
            }
        }

        let mut built = BTreeMap::new();
        for spec in specs.values() {
            self.build_block(spec, &specs, &mut built, &mut Vec::new())?;
        }
        Ok(built)
    }

    fn build_block(
        &self,
        spec: &BlockSpec,
        specs: &BTreeMap<&str, &BlockSpec>,
        built: &mut BTreeMap<String, Arc<Block>>,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<Block>, PlanError> {
        let id = spec.descriptor.id.as_str();
        if let Some(block) = built.get(id) {
            return Ok(block.clone());
        }
        if visiting.iter().any(|other| other == id) {
            return Err(PlanError::ExtensionCycle {
                block: id.to_string(),
            });
        }
        visiting.push(id.to_string());

        let mut block = Block::new(spec.descriptor.clone());
        for access in Access::ALL {
            block = block.with_resolver(access, self.resolver(spec, access)?);
        }
        if let Some(parent) = &spec.descriptor.extends {
            let parent_spec = specs
                .get(parent.as_str())
                .ok_or_else(|| PlanError::UnknownBlock {
                    block: parent.clone(),
                    referenced_by: format!("block \"{}\"", id),
                })?;
            let parent = self.build_block(parent_spec, specs, built, visiting)?;
            block = block.with_extended(parent);
        }

        visiting.pop();
        let block = Arc::new(block);
        built.insert(id.to_string(), block.clone());
        Ok(block)
    }

    /// Inline resources first, then the tier's directory.
    fn resolver(&self, spec: &BlockSpec, access: Access) -> Result<SharedResolver, PlanError> {
        let id = spec.descriptor.id.as_str();
        let mut members = CompoundResolver::new();

        let inline = spec.resources.get(access);
        if !inline.is_empty() {
            let table: TableResolver = inline
                .iter()
                .map(|(name, contents)| {
                    Resource::inline(id, name.as_str(), access, contents.clone())
                })
                .collect();
            members.add(Arc::new(table));
        }

        if let Some(directory) = spec.directories.get(access) {
            let root = match &self.base {
                Some(base) => base.join(directory),
                None => directory.clone(),
            };
            members.add(Arc::new(DirectoryResolver::new(id, access, root)?));
        }

        if members.is_empty() {
            Ok(Arc::new(EmptyResolver))
        } else {
            Ok(Arc::new(members))
        }
    }

    /// Build the instances of the plan, in declaration order.
    pub fn load(&self) -> Result<Vec<Instance>, PlanError> {
        let blocks = self.blocks()?;

        let mut ids: BTreeMap<&str, InstanceId> = BTreeMap::new();
        let mut declared = Vec::with_capacity(self.instances.len());
        for spec in &self.instances {
            let id = InstanceId::new();
            if ids.insert(spec.name.as_str(), id).is_some() {
                return Err(PlanError::Duplicate {
                    kind: "instance",
                    name: spec.name.clone(),
                });
            }
            declared.push((id, spec));
        }

        declared
            .into_iter()
            .map(|(id, spec)| {
                let block = blocks
                    .get(&spec.block)
                    .cloned()
                    .ok_or_else(|| PlanError::UnknownBlock {
                        block: spec.block.clone(),
                        referenced_by: format!("instance \"{}\"", spec.name),
                    })?;

                let mut instance = Instance::with_id(id, spec.name.as_str(), block);
                for (wiring, target) in &spec.wirings {
                    let target = ids.get(target.as_str()).copied().ok_or_else(|| {
                        PlanError::UnknownInstance {
                            instance: target.clone(),
                            referenced_by: format!("wiring \"{}\" of \"{}\"", wiring, spec.name),
                        }
                    })?;
                    instance = instance.wire_id(wiring.as_str(), target)?;
                }
                Ok(instance.with_configuration(spec.configuration.clone()))
            })
            .collect()
    }

    /// Load the plan and deploy it on a new kernel.
    ///
    /// Every instance is started when this returns.
    pub fn deploy(&self, registry: ComposerRegistry) -> Result<Arc<KernelDeployer>, PlanError> {
        let instances = self.load()?;
        tracing::debug!(
            blocks = self.blocks.len(),
            instances = instances.len(),
            "deploying plan"
        );

        let deployer = KernelDeployer::new(self.kernel.clone(), registry, Logger::default());
        deployer.deploy_all(instances)?;
        Ok(deployer)
    }
}
