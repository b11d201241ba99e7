//! Custom Elements
//!
//! Custom element registry and lifecycle callbacks.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{ElementRef, NodeId};

/// Lifecycle callbacks of a constructed custom element
///
/// Every method defaults to a no-op.
pub trait CustomElement {
    /// Element became connected to the document
    fn connected(&self) {}

    /// Element was removed from the document
    fn disconnected(&self) {}

    /// An observed attribute was set or removed
    fn attribute_changed(&self, _name: &str, _old_value: Option<&str>, _new_value: Option<&str>) {}
}

/// Builds the custom element instance backing a freshly created element
pub trait ElementConstructor {
    fn construct(&self, element: ElementRef) -> Rc<dyn CustomElement>;
}

impl<F> ElementConstructor for F
where
    F: Fn(ElementRef) -> Rc<dyn CustomElement>,
{
    fn construct(&self, element: ElementRef) -> Rc<dyn CustomElement> {
        self(element)
    }
}

/// Custom element definition
#[derive(Clone)]
pub struct CustomElementDefinition {
    pub name: String,
    /// Attributes whose changes produce `attribute_changed` reactions
    pub observed_attributes: Vec<String>,
    constructor: Rc<dyn ElementConstructor>,
}

impl CustomElementDefinition {
    /// Whether changes to `attribute` are reported to instances
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }

    pub(crate) fn construct(&self, element: ElementRef) -> Rc<dyn CustomElement> {
        self.constructor.construct(element)
    }
}

impl fmt::Debug for CustomElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomElementDefinition")
            .field("name", &self.name)
            .field("observed_attributes", &self.observed_attributes)
            .finish_non_exhaustive()
    }
}

/// Custom elements registry
#[derive(Debug, Default)]
pub struct CustomElementRegistry {
    definitions: HashMap<String, CustomElementDefinition>,
}

/// Custom element lifecycle callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCallback {
    Connected,
    Disconnected,
    AttributeChanged,
}

/// Lifecycle callback info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleCallbackInfo {
    pub callback: LifecycleCallback,
    pub element_id: NodeId,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl LifecycleCallbackInfo {
    pub fn connected(element_id: NodeId) -> Self {
        Self::plain(LifecycleCallback::Connected, element_id)
    }

    pub fn disconnected(element_id: NodeId) -> Self {
        Self::plain(LifecycleCallback::Disconnected, element_id)
    }

    pub fn attribute_changed(
        element_id: NodeId,
        name: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            callback: LifecycleCallback::AttributeChanged,
            element_id,
            attribute_name: Some(name.to_string()),
            old_value,
            new_value,
        }
    }

    fn plain(callback: LifecycleCallback, element_id: NodeId) -> Self {
        Self {
            callback,
            element_id,
            attribute_name: None,
            old_value: None,
            new_value: None,
        }
    }
}

/// Pending reactions collected during one DOM operation
#[derive(Debug, Default)]
pub struct CallbackQueue {
    callbacks: Vec<LifecycleCallbackInfo>,
}

impl CallbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, info: LifecycleCallbackInfo) {
        self.callbacks.push(info);
    }

    pub fn drain(&mut self) -> Vec<LifecycleCallbackInfo> {
        std::mem::take(&mut self.callbacks)
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a custom element
    pub fn define(
        &mut self,
        name: &str,
        observed_attributes: Vec<String>,
        constructor: Rc<dyn ElementConstructor>,
    ) -> Result<(), CustomElementError> {
        if !Self::is_valid_name(name) {
            return Err(CustomElementError::InvalidName(name.to_string()));
        }

        if self.definitions.contains_key(name) {
            return Err(CustomElementError::AlreadyDefined(name.to_string()));
        }

        let definition = CustomElementDefinition {
            name: name.to_string(),
            observed_attributes,
            constructor,
        };
        self.definitions.insert(name.to_string(), definition);
        Ok(())
    }

    /// Get element definition
    pub fn get(&self, name: &str) -> Option<&CustomElementDefinition> {
        self.definitions.get(name)
    }

    /// Check if element is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Validate custom element name
    pub fn is_valid_name(name: &str) -> bool {
        // Must contain hyphen
        if !name.contains('-') {
            return false;
        }

        // Must start with lowercase letter
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return false;
        }

        const RESERVED: &[&str] = &[
            "annotation-xml", "color-profile", "font-face",
            "font-face-src", "font-face-uri", "font-face-format",
            "font-face-name", "missing-glyph",
        ];
        if RESERVED.contains(&name) {
            return false;
        }

        name.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    }
}

/// Custom element errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomElementError {
    #[error("Invalid custom element name: {0}")]
    InvalidName(String),

    #[error("Custom element already defined: {0}")]
    AlreadyDefined(String),
}
