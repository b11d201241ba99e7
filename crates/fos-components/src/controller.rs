//! Component Lifecycle Controller
//!
//! `Binding` is the result of one factory run: hooks, props store and render
//! function. `ComponentElement` is the custom element instance the document
//! constructs for a component tag. With shared isolation every element of a
//! tag points at the same binding; the binding drives whichever element
//! initialized most recently.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use fos_dom::{CustomElement, ElementRef, NodeId};

use crate::props::PropsObserver;
use crate::{Config, HookContext, Hooks, PropKey, PropValue, Props, Renderer};

/// Render function returned by a component factory
pub(crate) type RenderFn<T> = Box<dyn Fn(&[NodeId]) -> T>;

/// Type-erased component factory
pub(crate) type Factory<T> = dyn Fn(&HookContext, &Props) -> RenderFn<T>;

/// Hooks, props and render function produced by one factory run
pub(crate) struct Binding<R: Renderer> {
    tag: String,
    pub(crate) hooks: Hooks,
    pub(crate) props: Props,
    render: RenderFn<R::Template>,
    renderer: Rc<R>,
    config: Config,
    /// Element the props store updates and reflects into
    node: RefCell<Weak<ComponentElement<R>>>,
    /// Children captured at first connection
    children: RefCell<Vec<NodeId>>,
    /// Keys read by the most recent render
    read_keys: RefCell<HashSet<PropKey>>,
}

impl<R: Renderer> Binding<R> {
    /// Run `factory` with a fresh context and store
    pub(crate) fn setup(
        tag: &str,
        factory: &Factory<R::Template>,
        renderer: Rc<R>,
        config: Config,
    ) -> Rc<Self> {
        let context = HookContext::open();
        let props = Props::new();
        let render = factory(&context, &props);
        let hooks = context.seal();

        let binding = Rc::new(Self {
            tag: tag.to_string(),
            hooks,
            props,
            render,
            renderer,
            config,
            node: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            read_keys: RefCell::new(HashSet::new()),
        });
        let observer: Rc<dyn PropsObserver> = binding.clone();
        binding.props.attach(Rc::downgrade(&observer));
        binding
    }

    fn node(&self) -> Option<Rc<ComponentElement<R>>> {
        self.node.borrow().upgrade()
    }
}

impl<R: Renderer> PropsObserver for Binding<R> {
    fn prop_written(&self, key: &PropKey) {
        let Some(node) = self.node() else {
            return;
        };
        tracing::trace!("<{}> prop {} written", self.tag, key);
        node.update();
        node.reflect();
    }
}

/// Custom element instance backing one component element
pub(crate) struct ComponentElement<R: Renderer> {
    element: ElementRef,
    binding: Rc<Binding<R>>,
    this: Weak<Self>,
    initialized: Cell<bool>,
    reflecting: Cell<bool>,
}

impl<R: Renderer> ComponentElement<R> {
    pub(crate) fn new(element: ElementRef, binding: Rc<Binding<R>>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            element,
            binding,
            this: this.clone(),
            initialized: Cell::new(false),
            reflecting: Cell::new(false),
        })
    }

    /// One-time setup on first connection
    fn initialize(&self) {
        let binding = &self.binding;
        *binding.node.borrow_mut() = self.this.clone();
        *binding.children.borrow_mut() = self.element.children();
        self.seed();
        self.initialized.set(true);
        tracing::debug!("Initialized <{}> {:?}", binding.tag, self.element);
    }

    /// Copy host attributes into the store; other named keys become undefined
    fn seed(&self) {
        let props = &self.binding.props;
        let names = self.element.attribute_names();
        for name in &names {
            let value = PropValue::from(self.element.get_attribute(name));
            props.store(PropKey::from(name), value);
        }
        for key in props.keys() {
            let absent = key.as_name().is_some_and(|name| !names.iter().any(|n| n == name));
            if absent {
                props.store(key, PropValue::Undefined);
            }
        }
    }

    /// Render into the host; false if the renderer failed
    fn update(&self) -> bool {
        let binding = &self.binding;
        let children = binding.children.borrow().clone();

        binding.props.begin_render_scope();
        let template = (binding.render)(&children);
        let read_keys = binding.props.end_render_scope();
        *binding.read_keys.borrow_mut() = read_keys;

        tracing::trace!("Rendering <{}> {:?}", binding.tag, self.element);
        match binding.renderer.render(template, &self.element) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("Failed to render <{}>: {}", binding.tag, err);
                false
            }
        }
    }

    fn reflect(&self) {
        let _guard = ReflectGuard::enter(&self.reflecting);
        self.binding
            .props
            .reflect(&self.element, self.binding.hooks.observed_attributes());
    }
}

impl<R: Renderer> CustomElement for ComponentElement<R> {
    fn connected(&self) {
        if !self.initialized.get() {
            self.initialize();
        }
        if self.update() {
            self.binding.hooks.run_mounted(&self.element);
        }
    }

    fn disconnected(&self) {
        self.binding.hooks.run_unmounted();
    }

    fn attribute_changed(&self, name: &str, _old_value: Option<&str>, new_value: Option<&str>) {
        if !self.initialized.get() {
            return;
        }
        if self.binding.config.guard_reflection && self.reflecting.get() {
            return;
        }

        let key = PropKey::from(name);
        self.binding.props.store(key.clone(), PropValue::from(new_value));

        let read = self.binding.read_keys.borrow().contains(&key);
        if read || !self.binding.config.skip_unread_attributes {
            self.update();
        }
    }
}

/// Marks an element as reflecting until dropped
struct ReflectGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> ReflectGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for ReflectGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}
