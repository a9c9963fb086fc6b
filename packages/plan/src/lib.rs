//! # blockwire-plan
//!
//! Deployment plans for the Blockwire kernel, and the `blockwire` command
//! line that runs them.
//!
//! A plan is a JSON document listing blocks (descriptor, inline resources,
//! resource directories) and the instances to deploy from them. Wirings
//! refer to other instances by name.
//!
//! ## Usage
//!
//! ```bash
//! # Deploy a plan and resolve two names through it
//! blockwire site.json --resolve app auth:login.html --resolve auth style.css
//!
//! # With debug logging
//! blockwire site.json -v
//! ```

pub mod cli;
mod error;
pub mod plan;

pub use error::PlanError;
pub use plan::{BlockSpec, DeploymentPlan, InstanceSpec, TierDirectories, TierResources};
