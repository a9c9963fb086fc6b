//! Roles, wiring views and wires.
//!
//! A [`Wire`] is the handle a block gets when it looks up a component of a
//! block it is wired to. The component behind it is acquired lazily from the
//! target block's composer on first use and can be released or disposed
//! through the wire.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use blockwire_resolution::{Resource, SharedResolver};

use crate::component::Component;
use crate::composer::Composer;
use crate::error::WiringError;
use crate::logging::Logger;
use crate::wirings::DeployedWirings;

/// The identity of an interface a component can be wired as.
#[derive(Clone, Copy)]
pub struct Role {
    id: TypeId,
    name: &'static str,
}

impl Role {
    /// The role for type `R`, usually a trait object type.
    pub fn of<R: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<R>(),
            name: type_name::<R>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name of the role, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({})", self.name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Resolution and wiring as seen from inside a block.
///
/// # Object Safety
///
/// This trait is object-safe. Typed lookups are provided by [`WiringsExt`].
pub trait Wirings: Send + Sync {
    /// Resolve a resource name, possibly prefixed with `<wiring>:`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing visible under this name.
    /// * `Ok(Some(resource))` - The resource.
    /// * `Err(WiringError::Undeployed)` - A wiring points at nothing.
    /// * `Err(WiringError::Dropped)` - The block behind a wrapper is gone.
    fn resolve(&self, name: &str) -> Result<Option<Arc<Resource>>, WiringError>;

    /// Create an untyped wire to the component of wiring `name`.
    fn wire(&self, role: Role, name: &str) -> Result<ProxyWire, WiringError>;
}

/// Typed lookups for every [`Wirings`].
pub trait WiringsExt: Wirings {
    /// Look up the component of wiring `name` as role `R`.
    fn lookup<R: ?Sized + 'static>(&self, name: &str) -> Result<Wire<R>, WiringError> {
        self.wire(Role::of::<R>(), name).map(ProxyWire::into_wire)
    }
}

impl<T: Wirings + ?Sized> WiringsExt for T {}

/// A restricted view of a deployed block.
///
/// Only resolution and lookup go through; the block's internals stay hidden.
/// The view does not keep the block alive.
#[derive(Clone)]
pub struct WiringsWrapper {
    instance: Arc<str>,
    inner: Weak<DeployedWirings>,
}

impl WiringsWrapper {
    pub(crate) fn new(instance: &str, inner: Weak<DeployedWirings>) -> Self {
        Self {
            instance: Arc::from(instance),
            inner,
        }
    }

    /// Name of the wrapped block instance.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    fn upgrade(&self) -> Result<Arc<DeployedWirings>, WiringError> {
        self.inner.upgrade().ok_or_else(|| WiringError::Dropped {
            instance: self.instance.to_string(),
        })
    }
}

impl Wirings for WiringsWrapper {
    fn resolve(&self, name: &str) -> Result<Option<Arc<Resource>>, WiringError> {
        self.upgrade()?.resolve(name)
    }

    fn wire(&self, role: Role, name: &str) -> Result<ProxyWire, WiringError> {
        self.upgrade()?.wire(role, name)
    }
}

impl fmt::Debug for WiringsWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WiringsWrapper({})", self.instance)
    }
}

enum WireState {
    Idle,
    Holding(Component),
    Disposed,
}

/// An untyped wire to a block's component.
///
/// Holds at most one component at a time. Dropping the wire releases it.
pub struct ProxyWire {
    composer: Arc<dyn Composer>,
    role: Role,
    wirings: WiringsWrapper,
    resolver: SharedResolver,
    logger: Logger,
    state: Mutex<WireState>,
}

impl ProxyWire {
    pub(crate) fn new(
        composer: Arc<dyn Composer>,
        role: Role,
        wirings: WiringsWrapper,
        resolver: SharedResolver,
        logger: Logger,
    ) -> Self {
        Self {
            composer,
            role,
            wirings,
            resolver,
            logger,
            state: Mutex::new(WireState::Idle),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// View of the block providing the component.
    pub fn wirings(&self) -> &WiringsWrapper {
        &self.wirings
    }

    /// Public resolver of the block that looked the wire up.
    pub fn resolver(&self) -> &SharedResolver {
        &self.resolver
    }

    /// The wired component, acquiring it from the composer if needed.
    pub fn component(&self) -> Result<Component, WiringError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            WireState::Holding(component) => Ok(component.clone()),
            WireState::Disposed => Err(WiringError::Disposed { role: self.role }),
            WireState::Idle => {
                let component = self.composer.acquire(self.resolver.as_ref())?;
                self.logger.trace(format_args!(
                    "acquired {} for role {}",
                    component.class().name(),
                    self.role
                ));
                *state = WireState::Holding(component.clone());
                Ok(component)
            }
        }
    }

    /// Hand the held component back to the composer.
    ///
    /// The next access acquires a component again.
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, WireState::Idle) {
            WireState::Holding(component) => self.composer.release(component),
            WireState::Disposed => *state = WireState::Disposed,
            WireState::Idle => {}
        }
    }

    /// Dispose of the held component and invalidate the wire.
    pub fn dispose(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let WireState::Holding(component) = std::mem::replace(&mut *state, WireState::Disposed)
        {
            self.composer.dispose(component);
        }
        self.logger
            .trace(format_args!("disposed wire for role {}", self.role));
    }

    /// False once the wire has been disposed.
    pub fn is_wired(&self) -> bool {
        !matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            WireState::Disposed
        )
    }

    /// Type the wire as role `R`.
    pub fn into_wire<R: ?Sized + 'static>(self) -> Wire<R> {
        Wire {
            proxy: self,
            _role: PhantomData,
        }
    }
}

impl Drop for ProxyWire {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let WireState::Holding(component) = std::mem::replace(state, WireState::Idle) {
            self.composer.release(component);
        }
    }
}

impl fmt::Debug for ProxyWire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyWire")
            .field("role", &self.role)
            .field("wirings", &self.wirings)
            .finish()
    }
}

/// A typed wire: the target block's component seen as role `R`.
///
/// # Example
///
/// ```ignore
/// let tokens: Wire<dyn TokenService> = app.lookup("auth")?;
/// let token = tokens.get()?.issue("alice");
/// tokens.release();
/// ```
pub struct Wire<R: ?Sized> {
    proxy: ProxyWire,
    _role: PhantomData<fn() -> Arc<R>>,
}

impl<R: ?Sized + 'static> Wire<R> {
    /// The wired component as `R`.
    pub fn get(&self) -> Result<Arc<R>, WiringError> {
        let component = self.proxy.component()?;
        component
            .as_role::<R>()
            .ok_or_else(|| WiringError::UnsupportedRole {
                instance: self.proxy.wirings.instance().to_string(),
                role: self.proxy.role,
            })
    }

    pub fn release(&self) {
        self.proxy.release();
    }

    pub fn dispose(&self) {
        self.proxy.dispose();
    }

    pub fn is_wired(&self) -> bool {
        self.proxy.is_wired()
    }

    pub fn role(&self) -> Role {
        self.proxy.role
    }

    /// The untyped wire underneath.
    pub fn proxy(&self) -> &ProxyWire {
        &self.proxy
    }
}

impl<R: ?Sized> fmt::Debug for Wire<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wire").field(&self.proxy).finish()
    }
}
