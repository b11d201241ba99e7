//! fOS DOM - Document Object Model
//!
//! In-memory host for custom elements: an arena-based tree with attribute
//! maps, a custom element registry and synchronous lifecycle reactions.
//!
//! Every reaction (`connected`, `disconnected`, `attribute_changed`) is
//! collected while the tree is borrowed and invoked after the borrow is
//! released, before the mutating call returns. Callbacks are free to call
//! back into the document.

mod attributes;
mod custom_elements;
mod document;
mod node;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use custom_elements::{
    CallbackQueue, CustomElement, CustomElementDefinition, CustomElementError,
    CustomElementRegistry, ElementConstructor, LifecycleCallback, LifecycleCallbackInfo,
};
pub use document::{Document, ElementRef, MutationKind, MutationRecord};
pub use node::{ElementData, Node, NodeData};
pub use tree::{DomError, DomResult, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Invalid/null node ID
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
