//! Composers: the strategies building the component a block exposes.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use blockwire_resolution::Resolver;

use crate::component::{Component, ComponentClass, ComponentContext};
use crate::config::Configuration;
use crate::error::ComposerError;
use crate::logging::{Logger, Logging};
use crate::wire::{Role, WiringsWrapper};

/// Builds, hands out and takes back the components of one block.
///
/// A composer is created when its block is deployed, then contextualized with
/// the block's wiring view and configured with the instance configuration
/// when the block is initialized. Optional capabilities are discovered
/// through [`Composer::lifecycle`] and [`Composer::logging_mut`].
pub trait Composer: Send + Sync {
    /// Receive the view of the block this composer belongs to.
    fn contextualize(&self, wirings: WiringsWrapper) -> Result<(), ComposerError>;

    /// Receive the configuration of the block instance.
    fn configure(&self, configuration: &Configuration) -> Result<(), ComposerError>;

    /// Whether the components handed out can be seen as `role`.
    fn provides(&self, role: &Role) -> bool;

    /// Hand out a component for a wire owned by a block whose public
    /// resources are reachable through `caller`.
    fn acquire(&self, caller: &dyn Resolver) -> Result<Component, ComposerError>;

    /// Take back a component that is no longer used by its wire.
    fn release(&self, component: Component) {
        drop(component);
    }

    /// Take back a component whose wire has been disposed.
    fn dispose(&self, component: Component) {
        drop(component);
    }

    /// The lifecycle capability, if this composer has it.
    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        None
    }

    /// The logging capability, if this composer has it.
    fn logging_mut(&mut self) -> Option<&mut dyn Logging> {
        None
    }
}

/// Block lifecycle notifications.
pub trait Lifecycle: Send + Sync {
    /// The block has been deployed, contextualized and configured.
    fn init(&self) -> Result<(), ComposerError>;

    /// Every block of the deployment has been initialized.
    fn start(&self);

    /// The block is being taken down.
    fn destroy(&self) -> Result<(), ComposerError>;
}

/// State every composer receives before handing out components.
struct Bindings {
    wirings: OnceLock<WiringsWrapper>,
    configuration: OnceLock<Configuration>,
    logger: Logger,
}

impl Bindings {
    fn new() -> Self {
        Self {
            wirings: OnceLock::new(),
            configuration: OnceLock::new(),
            logger: Logger::default(),
        }
    }

    fn contextualize(&self, wirings: WiringsWrapper) -> Result<(), ComposerError> {
        self.wirings
            .set(wirings)
            .map_err(|_| ComposerError::new("composer already contextualized"))
    }

    fn configure(&self, configuration: &Configuration) -> Result<(), ComposerError> {
        self.configuration
            .set(configuration.clone())
            .map_err(|_| ComposerError::new("composer already configured"))
    }

    fn instantiate(
        &self,
        class: &Arc<ComponentClass>,
        caller: Option<&dyn Resolver>,
    ) -> Result<Component, ComposerError> {
        let wirings = self.wirings.get().ok_or_else(|| {
            ComposerError::new(format!(
                "composer for {} used before being contextualized",
                class.name()
            ))
        })?;
        let empty = Configuration::empty();
        let ctx = ComponentContext {
            configuration: self.configuration.get().unwrap_or(&empty),
            wirings,
            caller,
            logger: &self.logger,
        };
        class.instantiate(&ctx)
    }
}

/// The pass-through composer.
///
/// Builds a new component of its class for every acquisition; released and
/// disposed components are simply dropped.
pub struct SimpleComposer {
    class: Arc<ComponentClass>,
    bindings: Bindings,
}

impl SimpleComposer {
    pub fn new(class: Arc<ComponentClass>) -> Self {
        Self {
            class,
            bindings: Bindings::new(),
        }
    }

    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }
}

impl Composer for SimpleComposer {
    fn contextualize(&self, wirings: WiringsWrapper) -> Result<(), ComposerError> {
        self.bindings.contextualize(wirings)
    }

    fn configure(&self, configuration: &Configuration) -> Result<(), ComposerError> {
        self.bindings.configure(configuration)
    }

    fn provides(&self, role: &Role) -> bool {
        self.class.provides(role)
    }

    fn acquire(&self, caller: &dyn Resolver) -> Result<Component, ComposerError> {
        self.bindings.instantiate(&self.class, Some(caller))
    }

    fn logging_mut(&mut self) -> Option<&mut dyn Logging> {
        Some(self)
    }
}

impl Logging for SimpleComposer {
    fn logger(&mut self, logger: Logger) {
        self.bindings.logger = logger;
    }
}

/// A composer sharing one component among all wires.
///
/// The component is built when the block is initialized and dropped when it
/// is destroyed. Released and disposed handles leave it untouched.
pub struct SingletonComposer {
    class: Arc<ComponentClass>,
    bindings: Bindings,
    instance: Mutex<Option<Component>>,
}

impl SingletonComposer {
    pub fn new(class: Arc<ComponentClass>) -> Self {
        Self {
            class,
            bindings: Bindings::new(),
            instance: Mutex::new(None),
        }
    }
}

impl Composer for SingletonComposer {
    fn contextualize(&self, wirings: WiringsWrapper) -> Result<(), ComposerError> {
        self.bindings.contextualize(wirings)
    }

    fn configure(&self, configuration: &Configuration) -> Result<(), ComposerError> {
        self.bindings.configure(configuration)
    }

    fn provides(&self, role: &Role) -> bool {
        self.class.provides(role)
    }

    fn acquire(&self, _caller: &dyn Resolver) -> Result<Component, ComposerError> {
        self.instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                ComposerError::new(format!("singleton {} is not initialized", self.class.name()))
            })
    }

    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        Some(self)
    }

    fn logging_mut(&mut self) -> Option<&mut dyn Logging> {
        Some(self)
    }
}

impl Lifecycle for SingletonComposer {
    fn init(&self) -> Result<(), ComposerError> {
        let component = self.bindings.instantiate(&self.class, None)?;
        *self.instance.lock().unwrap_or_else(PoisonError::into_inner) = Some(component);
        self.bindings
            .logger
            .debug(format_args!("singleton {} created", self.class.name()));
        Ok(())
    }

    fn start(&self) {
        self.bindings
            .logger
            .debug(format_args!("singleton {} started", self.class.name()));
    }

    fn destroy(&self) -> Result<(), ComposerError> {
        let previous = self
            .instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            self.bindings
                .logger
                .debug(format_args!("singleton {} destroyed", self.class.name()));
        }
        Ok(())
    }
}

impl Logging for SingletonComposer {
    fn logger(&mut self, logger: Logger) {
        self.bindings.logger = logger;
    }
}
