//! fOS Components - Reactive custom elements
//!
//! Describes a widget as a function of a mutable props store and turns it
//! into a self-rendering, lifecycle-aware custom element of a `fos_dom`
//! document.
//!
//! A component factory runs once per definition. It receives a
//! [`HookContext`] for registering observed attributes and mount/unmount
//! hooks, and the [`Props`] store for setting defaults, and returns the
//! render function. After an element of the tag connects, every write to the
//! store re-renders and reflects observed keys onto host attributes before
//! the write returns.
//!
//! ```rust,ignore
//! use fos_components::{ComponentHost, TextRenderer};
//! use fos_dom::Document;
//!
//! let host = ComponentHost::new(Document::new(), TextRenderer);
//! host.define_component("x-counter", |cx, props| {
//!     cx.observe_attribute("count");
//!     props.set("count", 0);
//!     let props = props.clone();
//!     move |_children| props.get("count").to_string()
//! })?;
//! ```

mod config;
mod controller;
mod definition;
mod error;
mod hooks;
mod props;
mod render;

pub use config::{Config, Isolation};
pub use definition::{ComponentDefinition, ComponentHost, Registration, define_component};
pub use error::ComponentError;
pub use hooks::{HookContext, Hooks, MountedHook, UnmountedHook};
pub use props::{PropKey, PropValue, Props, ReflectPolicy, Symbol};
pub use render::{Renderer, TextRenderer};
