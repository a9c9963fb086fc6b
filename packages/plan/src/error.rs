//! Errors raised while loading and running deployment plans.

use std::path::PathBuf;

use blockwire_kernel::{DeploymentError, WiringError};
use blockwire_resolution::ResourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("cannot read plan {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan")]
    Json(#[from] serde_json::Error),

    #[error("{kind} \"{name}\" is declared twice")]
    Duplicate { kind: &'static str, name: String },

    #[error("unknown block \"{block}\" referenced by {referenced_by}")]
    UnknownBlock { block: String, referenced_by: String },

    #[error("unknown instance \"{instance}\" referenced by {referenced_by}")]
    UnknownInstance {
        instance: String,
        referenced_by: String,
    },

    #[error("block \"{block}\" is part of an extension cycle")]
    ExtensionCycle { block: String },

    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error("cannot write output")]
    Output(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        let err = PlanError::UnknownBlock {
            block: "auth".to_string(),
            referenced_by: "instance \"app\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown block \"auth\" referenced by instance \"app\""
        );

        let err = PlanError::Duplicate {
            kind: "instance",
            name: "app".to_string(),
        };
        assert_eq!(err.to_string(), "instance \"app\" is declared twice");
    }

    #[test]
    fn io_errors_keep_path() {
        let err = PlanError::Io {
            path: PathBuf::from("/nowhere/plan.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nowhere/plan.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
