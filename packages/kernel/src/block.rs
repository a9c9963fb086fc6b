//! Loaded blocks: a descriptor together with its resources.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use blockwire_resolution::{Access, EmptyResolver, SharedResolver, Tiers};

use crate::descriptor::Descriptor;
use crate::error::DeploymentError;

/// A block as loaded by the packaging layer.
///
/// Each access tier has its own resolver. Blocks form a single-inheritance
/// chain through [`Block::extended_block`].
pub struct Block {
    descriptor: Descriptor,
    resolvers: Tiers<SharedResolver>,
    extended: Option<Arc<Block>>,
}

impl Block {
    /// A block with no resources and no extended block.
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            resolvers: Tiers::from_fn(|_| Arc::new(EmptyResolver) as SharedResolver),
            extended: None,
        }
    }

    /// Set the resolver for one access tier.
    pub fn with_resolver(mut self, access: Access, resolver: SharedResolver) -> Self {
        *self.resolvers.get_mut(access) = resolver;
        self
    }

    /// Extend another block. The descriptor's `extends` is updated to match.
    pub fn with_extended(mut self, extended: Arc<Block>) -> Self {
        self.descriptor.extends = Some(extended.id().to_string());
        self.extended = Some(extended);
        self
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// The resolver for resources declared at `access`.
    pub fn resolver(&self, access: Access) -> &SharedResolver {
        self.resolvers.get(access)
    }

    pub fn extended_block(&self) -> Option<&Arc<Block>> {
        self.extended.as_ref()
    }

    /// This block followed by every block it extends, closest first.
    ///
    /// Fails if a block id shows up twice or if the chain holds more than
    /// `max_depth` blocks.
    pub fn lineage(&self, max_depth: usize) -> Result<Vec<&Block>, DeploymentError> {
        let mut seen = HashSet::new();
        let mut lineage = Vec::new();
        let mut current = Some(self);

        while let Some(block) = current {
            if !seen.insert(block.id()) {
                return Err(DeploymentError::ExtensionCycle {
                    block: block.id().to_string(),
                });
            }
            if lineage.len() == max_depth {
                return Err(DeploymentError::ExtensionTooDeep {
                    block: self.id().to_string(),
                    max_depth,
                });
            }
            lineage.push(block);
            current = block.extended.as_deref();
        }

        Ok(lineage)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("descriptor", &self.descriptor)
            .field("extended", &self.extended.as_ref().map(|b| b.id()))
            .finish()
    }
}
