//! Hook registration
//!
//! A component factory receives a `HookContext`, an explicit registration
//! handle that is open only while the factory runs. When the factory returns
//! the handle is sealed and its registrations are frozen into `Hooks`.
//! Registering through a sealed handle (for instance from a clone captured in
//! an event handler) logs an error and does nothing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fos_dom::ElementRef;

use crate::ComponentError;

/// Callback run after every connection-triggered update
pub type MountedHook = Rc<dyn Fn(&ElementRef)>;

/// Callback run on every disconnection
pub type UnmountedHook = Rc<dyn Fn()>;

/// Registrations made during one factory run
#[derive(Clone, Default)]
pub struct Hooks {
    observed_attributes: Vec<String>,
    mounted: Vec<MountedHook>,
    unmounted: Vec<UnmountedHook>,
}

impl Hooks {
    /// Attribute names the host reports changes for, in registration order
    pub fn observed_attributes(&self) -> &[String] {
        &self.observed_attributes
    }

    /// Whether `attribute` is observed
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    pub fn unmounted_count(&self) -> usize {
        self.unmounted.len()
    }

    pub(crate) fn run_mounted(&self, host: &ElementRef) {
        for hook in &self.mounted {
            hook(host);
        }
    }

    pub(crate) fn run_unmounted(&self) {
        for hook in &self.unmounted {
            hook();
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("observed_attributes", &self.observed_attributes)
            .field("mounted", &self.mounted.len())
            .field("unmounted", &self.unmounted.len())
            .finish()
    }
}

/// Registration handle passed to a component factory
#[derive(Clone)]
pub struct HookContext {
    inner: Rc<RefCell<HookState>>,
}

struct HookState {
    open: bool,
    hooks: Hooks,
}

impl HookContext {
    pub(crate) fn open() -> Self {
        Self {
            inner: Rc::new(RefCell::new(HookState {
                open: true,
                hooks: Hooks::default(),
            })),
        }
    }

    /// Close the registration window and return what was registered
    pub(crate) fn seal(&self) -> Hooks {
        let mut state = self.inner.borrow_mut();
        state.open = false;
        state.hooks.clone()
    }

    /// Whether registrations are still accepted
    pub fn is_open(&self) -> bool {
        self.inner.borrow().open
    }

    /// Ask the host to report changes to `name`
    pub fn observe_attribute(&self, name: impl Into<String>) {
        let name = name.into();
        self.register("observe_attribute", |hooks| hooks.observed_attributes.push(name));
    }

    /// Register style names
    ///
    /// Names are registered as observed attributes, not injected as
    /// stylesheets.
    pub fn register_styles<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.register("register_styles", |hooks| hooks.observed_attributes.extend(names));
    }

    /// Run `hook` with the host element after every connection-triggered update
    pub fn on_mounted(&self, hook: impl Fn(&ElementRef) + 'static) {
        self.register("on_mounted", |hooks| hooks.mounted.push(Rc::new(hook)));
    }

    /// Run `hook` on every disconnection
    pub fn on_unmounted(&self, hook: impl Fn() + 'static) {
        self.register("on_unmounted", |hooks| hooks.unmounted.push(Rc::new(hook)));
    }

    fn register(&self, hook: &'static str, apply: impl FnOnce(&mut Hooks)) {
        let mut state = self.inner.borrow_mut();
        if !state.open {
            let err = ComponentError::OutsideSetup { hook };
            tracing::error!("{}", err);
            return;
        }
        apply(&mut state.hooks);
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("HookContext")
            .field("open", &state.open)
            .field("hooks", &state.hooks)
            .finish()
    }
}
