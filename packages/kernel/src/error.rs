//! Error types for the kernel.
//!
//! Two channels, mirroring when things can go wrong:
//! - [`DeploymentError`] is raised while a block instance is being deployed
//!   and aborts that deployment.
//! - [`WiringError`] is raised by a single `resolve`/`lookup` call on an
//!   already deployed block.
//!
//! A resource that does not resolve is not an error at all: resolution
//! returns `Ok(None)`.

use std::fmt;

use thiserror::Error;

use crate::wire::Role;

/// Boxed error carried as the cause of composer failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failure raised by a composer or by a component constructor.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ComposerError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ComposerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which part of a block's composer failed to materialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerPiece {
    /// The pass-through composer used when only a component class is named.
    Default,
    /// A composer named by the block descriptor.
    Named(String),
}

impl From<Option<&str>> for ComposerPiece {
    fn from(name: Option<&str>) -> Self {
        match name {
            Some(name) => ComposerPiece::Named(name.to_string()),
            None => ComposerPiece::Default,
        }
    }
}

impl fmt::Display for ComposerPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposerPiece::Default => f.write_str("default composer"),
            ComposerPiece::Named(name) => write!(f, "composer class \"{}\"", name),
        }
    }
}

/// Errors that abort the deployment of a block instance.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The composer named by the descriptor is not registered.
    #[error("cannot create {piece} instance for block \"{instance}\": no such composer")]
    UnknownComposer {
        instance: String,
        piece: ComposerPiece,
    },

    /// The component class named by the descriptor is not registered.
    #[error("cannot create {piece} instance for block \"{instance}\": unknown component class \"{class}\"")]
    UnknownComponentClass {
        instance: String,
        piece: ComposerPiece,
        class: String,
    },

    /// The composer has no constructor of the shape the descriptor requires.
    #[error("cannot create {piece} instance for block \"{instance}\": composer has no {expected}")]
    ConstructorShape {
        instance: String,
        piece: ComposerPiece,
        expected: &'static str,
    },

    /// The composer constructor itself failed.
    #[error("cannot create {piece} instance for block \"{instance}\"")]
    ComposerCreation {
        instance: String,
        piece: ComposerPiece,
        #[source]
        source: ComposerError,
    },

    /// Two wirings share a name.
    #[error("block instance \"{instance}\" declares wiring \"{wiring}\" twice")]
    DuplicateWiring { instance: String, wiring: String },

    /// A wiring name that can not be used as a routing prefix.
    #[error("block instance \"{instance}\" declares an invalid wiring name \"{wiring}\"")]
    InvalidWiringName { instance: String, wiring: String },

    /// One wiring's prefix would shadow another's.
    #[error("block instance \"{instance}\": wiring \"{wiring}\" shadows wiring \"{shadowed}\"")]
    OverlappingWirings {
        instance: String,
        wiring: String,
        shadowed: String,
    },

    /// A block appears twice in its own extension chain.
    #[error("block \"{block}\" appears twice in its extension chain")]
    ExtensionCycle { block: String },

    /// The extension chain is longer than allowed.
    #[error("extension chain of block \"{block}\" is deeper than {max_depth}")]
    ExtensionTooDeep { block: String, max_depth: usize },

    /// The instance is already registered with the deployer.
    #[error("block instance \"{instance}\" is already deployed")]
    AlreadyDeployed { instance: String },

    /// The deployer holds no block instance with this id.
    #[error("block instance {instance} is not deployed")]
    NotDeployed { instance: String },

    /// A lifecycle hook failed.
    #[error("cannot {phase} block instance \"{instance}\"")]
    Lifecycle {
        instance: String,
        phase: &'static str,
        #[source]
        source: WiringError,
    },
}

/// Errors raised by resolution and wiring on a deployed block.
#[derive(Debug, Error)]
pub enum WiringError {
    /// No wiring name was given.
    #[error("no name specified")]
    NoName,

    /// The block instance declares no wiring with this name, or its target is
    /// not deployed.
    #[error("unknown wiring \"{wiring}\" in block instance \"{instance}\"")]
    UnknownWiring { instance: String, wiring: String },

    /// The wired block has no composer.
    #[error("block instance \"{instance}\" does not provide components")]
    NoComponents { instance: String },

    /// The wired block's components do not implement the requested role.
    #[error("block instance \"{instance}\" does not provide role {role}")]
    UnsupportedRole { instance: String, role: Role },

    /// The wire was disposed.
    #[error("wire for role {role} has been disposed")]
    Disposed { role: Role },

    /// A declared wiring points at an instance that is not deployed.
    ///
    /// This indicates a broken deployment graph rather than a missing
    /// resource.
    #[error("wiring \"{wiring}\" of block instance \"{instance}\" is not deployed")]
    Undeployed { instance: String, wiring: String },

    /// The block instance behind a wrapper has been dropped.
    #[error("block instance \"{instance}\" is no longer deployed")]
    Dropped { instance: String },

    /// The composer failed.
    #[error("composer failure")]
    Composer(#[from] ComposerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn composer_piece_display() {
        assert_eq!(ComposerPiece::Default.to_string(), "default composer");
        assert_eq!(
            ComposerPiece::from(Some("pool")).to_string(),
            "composer class \"pool\""
        );
    }

    #[test]
    fn composer_creation_keeps_cause() {
        let e = DeploymentError::ComposerCreation {
            instance: "app".to_string(),
            piece: ComposerPiece::Default,
            source: ComposerError::with_source("constructor failed", std::io::Error::other("disk")),
        };
        let display = format!("{}", e);
        assert!(display.contains("default composer"));
        assert!(display.contains("\"app\""));

        let cause = StdError::source(&e).unwrap();
        assert_eq!(cause.to_string(), "constructor failed");
        assert_eq!(StdError::source(cause).unwrap().to_string(), "disk");
    }

    #[test]
    fn wiring_error_display() {
        let e = WiringError::UnknownWiring {
            instance: "app".to_string(),
            wiring: "nonexistent".to_string(),
        };
        assert!(format!("{}", e).contains("unknown wiring \"nonexistent\""));

        let e = WiringError::NoComponents {
            instance: "assets".to_string(),
        };
        assert!(format!("{}", e).contains("does not provide components"));

        let e = WiringError::Dropped {
            instance: "site".to_string(),
        };
        assert_eq!(e.to_string(), "block instance \"site\" is no longer deployed");
    }

    #[test]
    fn composer_error_converts() {
        let e: WiringError = ComposerError::new("boom").into();
        assert!(matches!(e, WiringError::Composer(_)));
        assert_eq!(StdError::source(&e).unwrap().to_string(), "boom");
    }
}
