//! Registry of composer constructors and component classes.
//!
//! Descriptors name composers and component classes by string. The registry
//! maps those names to constructors, and picks the constructor shape from the
//! descriptor's [`Composition`]:
//! - a component class is named: the composer is built around that class
//! - only a composer is named: the composer is built without arguments

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::component::ComponentClass;
use crate::composer::{Composer, SimpleComposer, SingletonComposer};
use crate::descriptor::Composition;
use crate::error::{ComposerError, ComposerPiece, DeploymentError};

/// Name of the composer used when a descriptor names only a component class.
pub const DEFAULT_COMPOSER: &str = "simple";

/// Name of the built-in sharing composer.
pub const SINGLETON_COMPOSER: &str = "singleton";

type NoArgConstructor = Arc<dyn Fn() -> Result<Box<dyn Composer>, ComposerError> + Send + Sync>;

type ClassConstructor =
    Arc<dyn Fn(Arc<ComponentClass>) -> Result<Box<dyn Composer>, ComposerError> + Send + Sync>;

#[derive(Default, Clone)]
struct ComposerEntry {
    no_arg: Option<NoArgConstructor>,
    with_class: Option<ClassConstructor>,
}

/// Maps composer and component class names to constructors.
#[derive(Clone)]
pub struct ComposerRegistry {
    composers: BTreeMap<String, ComposerEntry>,
    classes: BTreeMap<String, Arc<ComponentClass>>,
}

impl Default for ComposerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerRegistry {
    /// A registry holding the built-in `simple` and `singleton` composers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_class_composer(DEFAULT_COMPOSER, |class| Ok(SimpleComposer::new(class)));
        registry.register_class_composer(SINGLETON_COMPOSER, |class| {
            Ok(SingletonComposer::new(class))
        });
        registry
    }

    /// A registry with nothing registered, not even the default composer.
    pub fn empty() -> Self {
        Self {
            composers: BTreeMap::new(),
            classes: BTreeMap::new(),
        }
    }

    /// Register a composer built without arguments.
    pub fn register_composer<C, F>(&mut self, name: impl Into<String>, constructor: F)
    where
        C: Composer + 'static,
        F: Fn() -> Result<C, ComposerError> + Send + Sync + 'static,
    {
        let erased: NoArgConstructor = Arc::new(move || {
            constructor().map(|composer| Box::new(composer) as Box<dyn Composer>)
        });
        self.composers.entry(name.into()).or_default().no_arg = Some(erased);
    }

    /// Register a composer built around a component class.
    pub fn register_class_composer<C, F>(&mut self, name: impl Into<String>, constructor: F)
    where
        C: Composer + 'static,
        F: Fn(Arc<ComponentClass>) -> Result<C, ComposerError> + Send + Sync + 'static,
    {
        let erased: ClassConstructor = Arc::new(move |class: Arc<ComponentClass>| {
            constructor(class).map(|composer| Box::new(composer) as Box<dyn Composer>)
        });
        self.composers.entry(name.into()).or_default().with_class = Some(erased);
    }

    /// Register a component class under its own name.
    pub fn register_class(&mut self, class: ComponentClass) {
        self.classes
            .insert(class.name().to_string(), Arc::new(class));
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ComponentClass>> {
        self.classes.get(name)
    }

    pub fn has_composer(&self, name: &str) -> bool {
        self.composers.contains_key(name)
    }

    /// Build the composer of block instance `instance`.
    ///
    /// Returns `Ok(None)` when the block does not provide components.
    pub fn build(
        &self,
        instance: &str,
        composition: &Composition,
    ) -> Result<Option<Box<dyn Composer>>, DeploymentError> {
        match composition {
            Composition::Absent => Ok(None),
            Composition::Component { composer, class } => {
                let piece = ComposerPiece::from(composer.as_deref());
                let entry = self.entry(
                    instance,
                    composer.as_deref().unwrap_or(DEFAULT_COMPOSER),
                    &piece,
                )?;
                let class = self.classes.get(class).cloned().ok_or_else(|| {
                    DeploymentError::UnknownComponentClass {
                        instance: instance.to_string(),
                        piece: piece.clone(),
                        class: class.clone(),
                    }
                })?;
                let constructor =
                    entry
                        .with_class
                        .as_ref()
                        .ok_or_else(|| DeploymentError::ConstructorShape {
                            instance: instance.to_string(),
                            piece: piece.clone(),
                            expected: "component class constructor",
                        })?;
                constructor(class)
                    .map(Some)
                    .map_err(|source| DeploymentError::ComposerCreation {
                        instance: instance.to_string(),
                        piece,
                        source,
                    })
            }
            Composition::ComposerOnly { composer } => {
                let piece = ComposerPiece::Named(composer.clone());
                let entry = self.entry(instance, composer, &piece)?;
                let constructor =
                    entry
                        .no_arg
                        .as_ref()
                        .ok_or_else(|| DeploymentError::ConstructorShape {
                            instance: instance.to_string(),
                            piece: piece.clone(),
                            expected: "no-argument constructor",
                        })?;
                constructor()
                    .map(Some)
                    .map_err(|source| DeploymentError::ComposerCreation {
                        instance: instance.to_string(),
                        piece,
                        source,
                    })
            }
        }
    }

    fn entry(
        &self,
        instance: &str,
        name: &str,
        piece: &ComposerPiece,
    ) -> Result<&ComposerEntry, DeploymentError> {
        self.composers
            .get(name)
            .ok_or_else(|| DeploymentError::UnknownComposer {
                instance: instance.to_string(),
                piece: piece.clone(),
            })
    }
}

impl std::fmt::Debug for ComposerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposerRegistry")
            .field("composers", &self.composers.keys().collect::<Vec<_>>())
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::config::Configuration;
    use crate::wire::{Role, WiringsWrapper};
    use blockwire_resolution::Resolver;

    struct Inert;

    impl Composer for Inert {
        fn contextualize(&self, _wirings: WiringsWrapper) -> Result<(), ComposerError> {
            Ok(())
        }

        fn configure(&self, _configuration: &Configuration) -> Result<(), ComposerError> {
            Ok(())
        }

        fn provides(&self, _role: &Role) -> bool {
            false
        }

        fn acquire(&self, _caller: &dyn Resolver) -> Result<Component, ComposerError> {
            Err(ComposerError::new("inert"))
        }
    }

    fn registry() -> ComposerRegistry {
        let mut registry = ComposerRegistry::new();
        registry.register_class(ComponentClass::builder("Unit", |_| Ok(())).build());
        registry.register_composer("inert", || Ok(Inert));
        registry.register_composer("failing", || -> Result<Inert, ComposerError> {
            Err(ComposerError::with_source(
                "cannot start",
                std::io::Error::other("no socket"),
            ))
        });
        registry
    }

    fn component(composer: Option<&str>, class: &str) -> Composition {
        Composition::Component {
            composer: composer.map(str::to_string),
            class: class.to_string(),
        }
    }

    #[test]
    fn absent_builds_nothing() {
        assert!(registry().build("a", &Composition::Absent).unwrap().is_none());
    }

    #[test]
    fn default_composer_wraps_class() {
        let composer = registry().build("a", &component(None, "Unit")).unwrap();
        assert!(composer.is_some());
    }

    #[test]
    fn named_class_composer() {
        let composer = registry()
            .build("a", &component(Some(SINGLETON_COMPOSER), "Unit"))
            .unwrap()
            .unwrap();
        assert!(composer.lifecycle().is_some());
    }

    #[test]
    fn composer_only_uses_no_arg_constructor() {
        let composition = Composition::ComposerOnly {
            composer: "inert".to_string(),
        };
        assert!(registry().build("a", &composition).unwrap().is_some());
    }

    #[test]
    fn unknown_class() {
        let err = registry()
            .build("a", &component(None, "Missing"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DeploymentError::UnknownComponentClass {
                ref class,
                piece: ComposerPiece::Default,
                ..
            } if class == "Missing"
        ));
    }

    #[test]
    fn unknown_composer() {
        let composition = Composition::ComposerOnly {
            composer: "pool".to_string(),
        };
        let err = registry().build("a", &composition).err().unwrap();
        assert!(err.to_string().contains("composer class \"pool\""));
    }

    #[test]
    fn missing_default_composer() {
        let mut registry = ComposerRegistry::empty();
        registry.register_class(ComponentClass::builder("Unit", |_| Ok(())).build());
        let err = registry.build("a", &component(None, "Unit")).err().unwrap();
        assert!(matches!(
            err,
            DeploymentError::UnknownComposer {
                piece: ComposerPiece::Default,
                ..
            }
        ));
    }

    #[test]
    fn wrong_constructor_shape() {
        let err = registry()
            .build("a", &component(Some("inert"), "Unit"))
            .err()
            .unwrap();
        assert!(matches!(err, DeploymentError::ConstructorShape { .. }));

        let composition = Composition::ComposerOnly {
            composer: DEFAULT_COMPOSER.to_string(),
        };
        let err = registry().build("a", &composition).err().unwrap();
        assert!(matches!(err, DeploymentError::ConstructorShape { .. }));
    }

    #[test]
    fn constructor_failure_reports_cause() {
        let composition = Composition::ComposerOnly {
            composer: "failing".to_string(),
        };
        let err = registry().build("app", &composition).err().unwrap();
        match err {
            DeploymentError::ComposerCreation {
                instance, source, ..
            } => {
                assert_eq!(instance, "app");
                assert_eq!(source.message(), "cannot start");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
