//! Deployable block instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::block::Block;
use crate::config::Configuration;
use crate::error::DeploymentError;

/// Unique identifier for a block instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Create a new random InstanceId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One deployed use of a block.
///
/// An instance names the block it deploys, the other instances it is wired
/// to, and the configuration handed to the block's composer. It is built once
/// and not changed afterwards.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use blockwire_kernel::{Block, Descriptor, Instance};
///
/// let auth = Instance::new("auth", Arc::new(Block::new(Descriptor::new("auth-block"))));
/// let app = Instance::new("app", Arc::new(Block::new(Descriptor::new("app-block"))))
///     .wire("auth", &auth)
///     .unwrap();
///
/// assert_eq!(app.wiring("auth"), Some(&auth.id()));
/// ```
#[derive(Clone)]
pub struct Instance {
    id: InstanceId,
    name: String,
    block: Arc<Block>,
    wirings: BTreeMap<String, InstanceId>,
    configuration: Configuration,
}

impl Instance {
    pub fn new(name: impl Into<String>, block: Arc<Block>) -> Self {
        Self::with_id(InstanceId::new(), name, block)
    }

    /// Create an instance with a predetermined id.
    ///
    /// Useful when wirings must be declared before their targets exist.
    pub fn with_id(id: InstanceId, name: impl Into<String>, block: Arc<Block>) -> Self {
        Self {
            id,
            name: name.into(),
            block,
            wirings: BTreeMap::new(),
            configuration: Configuration::empty(),
        }
    }

    /// Declare a wiring named `name` to `target`.
    pub fn wire(self, name: impl Into<String>, target: &Instance) -> Result<Self, DeploymentError> {
        self.wire_id(name, target.id)
    }

    /// Declare a wiring named `name` to the instance with id `target`.
    ///
    /// Fails if the name is empty or already declared.
    pub fn wire_id(
        mut self,
        name: impl Into<String>,
        target: InstanceId,
    ) -> Result<Self, DeploymentError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DeploymentError::InvalidWiringName {
                instance: self.name,
                wiring: name,
            });
        }
        if self.wirings.contains_key(&name) {
            return Err(DeploymentError::DuplicateWiring {
                instance: self.name,
                wiring: name,
            });
        }
        self.wirings.insert(name, target);
        Ok(self)
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block(&self) -> &Arc<Block> {
        &self.block
    }

    /// The instance a wiring points to.
    pub fn wiring(&self, name: &str) -> Option<&InstanceId> {
        self.wirings.get(name)
    }

    /// Declared wiring names, in name order.
    pub fn wirings(&self) -> impl Iterator<Item = &str> {
        self.wirings.keys().map(String::as_str)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("block", &self.block.id())
            .field("wirings", &self.wirings)
            .finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use serde_json::json;

    fn instance(name: &str) -> Instance {
        Instance::new(name, Arc::new(Block::new(Descriptor::new(format!("{}-block", name)))))
    }

    #[test]
    fn instance_id_display() {
        let id = InstanceId::new();
        assert_eq!(format!("{}", id).len(), 36);
    }

    #[test]
    fn instance_id_default_is_random() {
        assert_ne!(InstanceId::default(), InstanceId::default());
    }

    #[test]
    fn instance_id_from_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(InstanceId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn wirings_are_ordered_by_name() {
        let db = instance("db");
        let cache = instance("cache");
        let app = instance("app")
            .wire("db", &db)
            .unwrap()
            .wire("cache", &cache)
            .unwrap();

        assert_eq!(app.wirings().collect::<Vec<_>>(), vec!["cache", "db"]);
        assert_eq!(app.wiring("db"), Some(&db.id()));
        assert!(app.wiring("nonexistent").is_none());
    }

    #[test]
    fn duplicate_wiring_rejected() {
        let db = instance("db");
        let err = instance("app")
            .wire("db", &db)
            .unwrap()
            .wire("db", &db)
            .unwrap_err();
        assert!(matches!(
            err,
            DeploymentError::DuplicateWiring { ref wiring, .. } if wiring == "db"
        ));
    }

    #[test]
    fn empty_wiring_name_rejected() {
        let db = instance("db");
        let err = instance("app").wire("", &db).unwrap_err();
        assert!(matches!(err, DeploymentError::InvalidWiringName { .. }));
    }

    #[test]
    fn configuration_passes_through() {
        let app = instance("app").with_configuration(Configuration::from(json!({"k": "v"})));
        assert_eq!(app.configuration().get_str("k"), Some("v"));
        assert_eq!(format!("{}", app), "app");
    }
}
