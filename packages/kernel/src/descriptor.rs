//! Block descriptors.
//!
//! A descriptor identifies a block type: the block it extends, and what it
//! provides in terms of components. Descriptors are loaded once by whatever
//! packages the blocks and are immutable afterwards.

use serde::{Deserialize, Serialize};

/// How a block builds the component it exposes.
///
/// Compiled once from the descriptor's optional composer and class names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// A component class is named. The composer, default or named, is built
    /// around that class.
    Component {
        composer: Option<String>,
        class: String,
    },
    /// Only a composer is named; it is built without arguments.
    ComposerOnly { composer: String },
    /// The block does not provide components.
    Absent,
}

/// The identity and public contract of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Block identifier, unique among loaded blocks.
    pub id: String,

    /// Identifier of the block this one extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Name of the composer building the exposed component.
    #[serde(default, rename = "composer", skip_serializing_if = "Option::is_none")]
    pub provided_composer: Option<String>,

    /// Name of the exposed component class.
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub provided_class: Option<String>,
}

impl Descriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extends: None,
            provided_composer: None,
            provided_class: None,
        }
    }

    pub fn with_composer(mut self, composer: impl Into<String>) -> Self {
        self.provided_composer = Some(composer.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.provided_class = Some(class.into());
        self
    }

    pub fn with_extends(mut self, block: impl Into<String>) -> Self {
        self.extends = Some(block.into());
        self
    }

    pub fn composition(&self) -> Composition {
        match (&self.provided_composer, &self.provided_class) {
            (composer, Some(class)) => Composition::Component {
                composer: composer.clone(),
                class: class.clone(),
            },
            (Some(composer), None) => Composition::ComposerOnly {
                composer: composer.clone(),
            },
            (None, None) => Composition::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_tags() {
        assert_eq!(Descriptor::new("a").composition(), Composition::Absent);

        assert_eq!(
            Descriptor::new("a").with_composer("pool").composition(),
            Composition::ComposerOnly {
                composer: "pool".to_string()
            }
        );

        assert_eq!(
            Descriptor::new("a").with_class("Tokens").composition(),
            Composition::Component {
                composer: None,
                class: "Tokens".to_string()
            }
        );

        assert_eq!(
            Descriptor::new("a")
                .with_composer("singleton")
                .with_class("Tokens")
                .composition(),
            Composition::Component {
                composer: Some("singleton".to_string()),
                class: "Tokens".to_string()
            }
        );
    }

    #[test]
    fn descriptor_json() {
        let descriptor: Descriptor = serde_json::from_str(
            r#"{"id": "auth", "extends": "base", "class": "TokenService"}"#,
        )
        .unwrap();
        assert_eq!(descriptor.id, "auth");
        assert_eq!(descriptor.extends.as_deref(), Some("base"));
        assert_eq!(descriptor.provided_class.as_deref(), Some("TokenService"));
        assert!(descriptor.provided_composer.is_none());

        let json = serde_json::to_string(&Descriptor::new("bare")).unwrap();
        assert_eq!(json, r#"{"id":"bare"}"#);
    }
}
