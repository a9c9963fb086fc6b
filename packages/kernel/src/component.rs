//! Component classes and their capability tables.
//!
//! A [`ComponentClass`] knows how to construct one kind of component and
//! which roles the component can be seen as. The table of roles replaces
//! runtime proxies: a [`Component`] is cast to a role through the cast
//! registered for that role.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use blockwire_resolution::Resolver;

use crate::config::Configuration;
use crate::error::ComposerError;
use crate::logging::Logger;
use crate::wire::{Role, Wirings};

/// A type-erased component object.
pub type ComponentObject = Arc<dyn Any + Send + Sync>;

type Constructor =
    Box<dyn Fn(&ComponentContext<'_>) -> Result<ComponentObject, ComposerError> + Send + Sync>;

type Cast<R> = Arc<dyn Fn(&ComponentObject) -> Option<Arc<R>> + Send + Sync>;

/// What a component constructor can see.
pub struct ComponentContext<'a> {
    /// Configuration of the block instance providing the component.
    pub configuration: &'a Configuration,
    /// Resolution and wiring view of the providing block.
    pub wirings: &'a dyn Wirings,
    /// Public resolver of the block that asked for the component, when the
    /// component is built for a wire.
    pub caller: Option<&'a dyn Resolver>,
    /// Logger of the providing block instance.
    pub logger: &'a Logger,
}

/// A constructor together with the roles its components provide.
pub struct ComponentClass {
    name: String,
    constructor: Constructor,
    casts: HashMap<TypeId, (Role, Box<dyn Any + Send + Sync>)>,
}

impl ComponentClass {
    /// Start describing a class whose components are of type `T`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use blockwire_kernel::ComponentClass;
    ///
    /// trait Greeter: Send + Sync {
    ///     fn greet(&self) -> String;
    /// }
    ///
    /// struct English;
    /// impl Greeter for English {
    ///     fn greet(&self) -> String {
    ///         "hello".to_string()
    ///     }
    /// }
    ///
    /// let class = ComponentClass::builder("English", |_ctx| Ok(English))
    ///     .provides(|c| c as Arc<dyn Greeter>)
    ///     .build();
    /// assert_eq!(class.name(), "English");
    /// ```
    pub fn builder<T, F>(name: impl Into<String>, constructor: F) -> ComponentClassBuilder<T>
    where
        T: Any + Send + Sync,
        F: Fn(&ComponentContext<'_>) -> Result<T, ComposerError> + Send + Sync + 'static,
    {
        ComponentClassBuilder {
            class: ComponentClass {
                name: name.into(),
                constructor: Box::new(move |ctx: &ComponentContext<'_>| {
                    constructor(ctx).map(|component| Arc::new(component) as ComponentObject)
                }),
                casts: HashMap::new(),
            },
            _component: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether components of this class can be seen as `role`.
    pub fn provides(&self, role: &Role) -> bool {
        self.casts.contains_key(&role.id())
    }

    /// Roles the components of this class provide, in no particular order.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.casts.values().map(|(role, _)| role)
    }

    /// Construct a new component.
    pub fn instantiate(
        self: &Arc<Self>,
        ctx: &ComponentContext<'_>,
    ) -> Result<Component, ComposerError> {
        let object = (self.constructor)(ctx)?;
        Ok(Component {
            object,
            class: self.clone(),
        })
    }

    fn cast<R: ?Sized + 'static>(&self, object: &ComponentObject) -> Option<Arc<R>> {
        let (_, cast) = self.casts.get(&TypeId::of::<R>())?;
        let cast = cast.downcast_ref::<Cast<R>>()?;
        cast(object)
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("roles", &self.roles().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder registering the roles of a [`ComponentClass`].
pub struct ComponentClassBuilder<T> {
    class: ComponentClass,
    _component: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ComponentClassBuilder<T> {
    /// Declare that components can be seen as `R`, converting with `cast`.
    pub fn provides<R: ?Sized + 'static>(
        mut self,
        cast: impl Fn(Arc<T>) -> Arc<R> + Send + Sync + 'static,
    ) -> Self {
        let erased: Cast<R> = Arc::new(move |object: &ComponentObject| {
            object.clone().downcast::<T>().ok().map(&cast)
        });
        self.class
            .casts
            .insert(TypeId::of::<R>(), (Role::of::<R>(), Box::new(erased)));
        self
    }

    pub fn build(self) -> ComponentClass {
        self.class
    }
}

/// A component built by a composer, remembering its class.
#[derive(Clone)]
pub struct Component {
    object: ComponentObject,
    class: Arc<ComponentClass>,
}

impl Component {
    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    pub fn object(&self) -> &ComponentObject {
        &self.object
    }

    /// View the component as `R`, if its class provides that role.
    pub fn as_role<R: ?Sized + 'static>(&self) -> Option<Arc<R>> {
        self.class.cast::<R>(&self.object)
    }

    /// Whether both handles refer to the same component object.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("class", &self.class.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WiringError;
    use crate::wire::ProxyWire;
    use blockwire_resolution::Resource;

    trait Counter: Send + Sync {
        fn count(&self) -> usize;
    }

    trait Named: Send + Sync {}

    struct Fixed(usize);

    impl Counter for Fixed {
        fn count(&self) -> usize {
            self.0
        }
    }

    struct NoWirings;

    impl Wirings for NoWirings {
        fn resolve(&self, _name: &str) -> Result<Option<Arc<Resource>>, WiringError> {
            Ok(None)
        }

        fn wire(&self, _role: Role, name: &str) -> Result<ProxyWire, WiringError> {
            Err(WiringError::UnknownWiring {
                instance: "test".to_string(),
                wiring: name.to_string(),
            })
        }
    }

    fn instantiate(class: &Arc<ComponentClass>, configuration: &Configuration) -> Component {
        let logger = Logger::default();
        let ctx = ComponentContext {
            configuration,
            wirings: &NoWirings,
            caller: None,
            logger: &logger,
        };
        class.instantiate(&ctx).unwrap()
    }

    fn counter_class() -> Arc<ComponentClass> {
        Arc::new(
            ComponentClass::builder("Fixed", |ctx| {
                let n = ctx
                    .configuration
                    .get("count")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(1);
                Ok(Fixed(n as usize))
            })
            .provides(|c| c as Arc<dyn Counter>)
            .build(),
        )
    }

    #[test]
    fn cast_to_provided_role() {
        let class = counter_class();
        let config = Configuration::from(serde_json::json!({"count": 3}));
        let component = instantiate(&class, &config);

        let counter = component.as_role::<dyn Counter>().unwrap();
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn cast_to_unprovided_role_fails() {
        let class = counter_class();
        let component = instantiate(&class, &Configuration::empty());
        assert!(component.as_role::<dyn Named>().is_none());
        assert!(!class.provides(&Role::of::<dyn Named>()));
        assert!(class.provides(&Role::of::<dyn Counter>()));
    }

    #[test]
    fn concrete_type_can_be_a_role() {
        let class = Arc::new(
            ComponentClass::builder("Fixed", |_| Ok(Fixed(9)))
                .provides(|c: Arc<Fixed>| c)
                .build(),
        );
        let component = instantiate(&class, &Configuration::empty());
        assert_eq!(component.as_role::<Fixed>().unwrap().0, 9);
    }

    #[test]
    fn each_instantiation_is_new() {
        let class = counter_class();
        let a = instantiate(&class, &Configuration::empty());
        let b = instantiate(&class, &Configuration::empty());
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn constructor_errors_propagate() {
        let class = Arc::new(
            ComponentClass::builder::<Fixed, _>("Broken", |_| Err(ComposerError::new("nope")))
                .build(),
        );
        let logger = Logger::default();
        let config = Configuration::empty();
        let ctx = ComponentContext {
            configuration: &config,
            wirings: &NoWirings,
            caller: None,
            logger: &logger,
        };
        let err = class.instantiate(&ctx).unwrap_err();
        assert_eq!(err.message(), "nope");
    }
}
