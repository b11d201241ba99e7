//! Document - High-level document API
//!
//! `Document` is a cheap-clone handle to shared document state. `ElementRef`
//! is a weak handle to one element; it stays valid as a value after the
//! document is dropped, but every operation on it then becomes a no-op.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::{
    CallbackQueue, CustomElement, CustomElementError, CustomElementRegistry, DomError, DomResult,
    DomTree, ElementConstructor, LifecycleCallback, LifecycleCallbackInfo, NodeId,
};

/// Kind of recorded mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    fn attributes(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    fn child_list(target: NodeId) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            attribute_name: None,
            old_value: None,
        }
    }
}

/// HTML Document
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

struct DocumentInner {
    tree: RefCell<DomTree>,
    registry: RefCell<CustomElementRegistry>,
    /// Constructed custom element instances by node
    instances: RefCell<HashMap<NodeId, Rc<dyn CustomElement>>>,
    body: NodeId,
    recording: Cell<bool>,
    records: RefCell<Vec<MutationRecord>>,
}

impl Document {
    /// Create a document with a `<body>` element
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        // Fresh arena: the root accepts any element child.
        let _ = tree.append_child(tree.root(), body);

        Self {
            inner: Rc::new(DocumentInner {
                tree: RefCell::new(tree),
                registry: RefCell::new(CustomElementRegistry::new()),
                instances: RefCell::new(HashMap::new()),
                body,
                recording: Cell::new(false),
                records: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get <body> element
    pub fn body(&self) -> ElementRef {
        self.element_ref(self.inner.body)
    }

    /// Handle to the element `id`, if it is an element
    pub fn element(&self, id: NodeId) -> Option<ElementRef> {
        let is_element = self.inner.tree.borrow().element(id).is_some();
        is_element.then(|| self.element_ref(id))
    }

    fn element_ref(&self, id: NodeId) -> ElementRef {
        ElementRef {
            doc: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Create a detached element, constructing its custom element if defined
    pub fn create_element(&self, tag: &str) -> ElementRef {
        let id = self.inner.tree.borrow_mut().create_element(tag);
        let element = self.element_ref(id);

        let definition = self.inner.registry.borrow().get(&tag.to_ascii_lowercase()).cloned();
        if let Some(definition) = definition {
            let instance = definition.construct(element.clone());
            self.inner.instances.borrow_mut().insert(id, instance);
        }
        element
    }

    /// Create a detached text node
    pub fn create_text(&self, text: &str) -> NodeId {
        self.inner.tree.borrow_mut().create_text(text)
    }

    /// Append `child` to `parent`
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.inner.append_child(parent, child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.inner.remove_child(parent, child)
    }

    /// Register a custom element and upgrade existing elements with its tag
    pub fn define(
        &self,
        name: &str,
        observed_attributes: Vec<String>,
        constructor: Rc<dyn ElementConstructor>,
    ) -> Result<(), CustomElementError> {
        self.inner
            .registry
            .borrow_mut()
            .define(name, observed_attributes, constructor)?;
        tracing::debug!("Defined custom element <{}>", name);

        let definition = self.inner.registry.borrow().get(name).cloned();
        let Some(definition) = definition else {
            return Ok(());
        };

        let candidates: Vec<NodeId> = {
            let tree = self.inner.tree.borrow();
            let instances = self.inner.instances.borrow();
            tree.iter()
                .filter(|(id, node)| {
                    node.as_element().is_some_and(|e| e.tag == name) && !instances.contains_key(id)
                })
                .map(|(id, _)| id)
                .collect()
        };

        let mut queue = CallbackQueue::new();
        for id in candidates {
            let instance = definition.construct(self.element_ref(id));
            self.inner.instances.borrow_mut().insert(id, instance);
            if self.inner.tree.borrow().is_connected(id) {
                queue.enqueue(LifecycleCallbackInfo::connected(id));
            }
            tracing::trace!("Upgraded {} to <{}>", id, name);
        }
        self.inner.run_reactions(queue);
        Ok(())
    }

    /// Check if a custom element is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.inner.registry.borrow().is_defined(name)
    }

    /// Concatenated text below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.inner.tree.borrow().text_content(id)
    }

    /// Read access to the tree
    pub fn with_tree<T>(&self, f: impl FnOnce(&DomTree) -> T) -> T {
        f(&self.inner.tree.borrow())
    }

    /// Start or stop recording mutations
    pub fn record_mutations(&self, enabled: bool) {
        self.inner.recording.set(enabled);
    }

    /// Take all mutation records collected so far
    pub fn take_mutation_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.inner.records.borrow_mut())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.inner.tree.borrow().len())
            .field("definitions", &self.inner.registry.borrow().len())
            .finish()
    }
}

impl DocumentInner {
    fn record(&self, record: MutationRecord) {
        if self.recording.get() {
            self.records.borrow_mut().push(record);
        }
    }

    /// Queue `make(id)` for every custom element in the subtree at `root`
    fn enqueue_subtree(
        &self,
        tree: &DomTree,
        root: NodeId,
        queue: &mut CallbackQueue,
        make: fn(NodeId) -> LifecycleCallbackInfo,
    ) {
        let instances = self.instances.borrow();
        for id in tree.inclusive_descendants(root) {
            if instances.contains_key(&id) {
                queue.enqueue(make(id));
            }
        }
    }

    fn observes(&self, id: NodeId, tag: &str, attribute: &str) -> bool {
        self.instances.borrow().contains_key(&id)
            && self
                .registry
                .borrow()
                .get(tag)
                .is_some_and(|d| d.observes(attribute))
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let mut queue = CallbackQueue::new();
        {
            let mut tree = self.tree.borrow_mut();
            let was_connected = tree.is_connected(child) && tree.parent(child).is_some();
            let old_parent = tree.parent(child);
            tree.append_child(parent, child)?;

            if was_connected {
                self.enqueue_subtree(&tree, child, &mut queue, LifecycleCallbackInfo::disconnected);
            }
            if tree.is_connected(child) {
                self.enqueue_subtree(&tree, child, &mut queue, LifecycleCallbackInfo::connected);
            }
            if let Some(old_parent) = old_parent {
                self.record(MutationRecord::child_list(old_parent));
            }
            self.record(MutationRecord::child_list(parent));
        }
        self.run_reactions(queue);
        Ok(())
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let mut queue = CallbackQueue::new();
        {
            let mut tree = self.tree.borrow_mut();
            let was_connected = tree.is_connected(child);
            tree.remove_child(parent, child)?;
            if was_connected {
                self.enqueue_subtree(&tree, child, &mut queue, LifecycleCallbackInfo::disconnected);
            }
            self.record(MutationRecord::child_list(parent));
        }
        self.run_reactions(queue);
        Ok(())
    }

    fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let mut queue = CallbackQueue::new();
        {
            let mut tree = self.tree.borrow_mut();
            let element = element_mut(&mut tree, id)?;
            let old_value = element.attrs.set_attribute(name, value);
            let tag = element.tag.clone();

            self.record(MutationRecord::attributes(id, name, old_value.clone()));
            if self.observes(id, &tag, name) {
                queue.enqueue(LifecycleCallbackInfo::attribute_changed(
                    id,
                    name,
                    old_value,
                    Some(value.to_string()),
                ));
            }
        }
        self.run_reactions(queue);
        Ok(())
    }

    fn remove_attribute(&self, id: NodeId, name: &str) -> DomResult<()> {
        let mut queue = CallbackQueue::new();
        {
            let mut tree = self.tree.borrow_mut();
            let element = element_mut(&mut tree, id)?;
            // Removing an absent attribute is not a mutation.
            let Some(old_value) = element.attrs.remove_named_item(name) else {
                return Ok(());
            };
            let tag = element.tag.clone();

            self.record(MutationRecord::attributes(id, name, Some(old_value.clone())));
            if self.observes(id, &tag, name) {
                queue.enqueue(LifecycleCallbackInfo::attribute_changed(
                    id,
                    name,
                    Some(old_value),
                    None,
                ));
            }
        }
        self.run_reactions(queue);
        Ok(())
    }

    fn set_text_content(&self, id: NodeId, text: &str) -> DomResult<()> {
        let mut queue = CallbackQueue::new();
        {
            let mut tree = self.tree.borrow_mut();
            element_mut(&mut tree, id)?;
            let connected = tree.is_connected(id);

            for child in tree.children(id).to_vec() {
                if connected {
                    self.enqueue_subtree(&tree, child, &mut queue, LifecycleCallbackInfo::disconnected);
                }
                tree.remove_child(id, child)?;
            }
            if !text.is_empty() {
                let node = tree.create_text(text);
                tree.append_child(id, node)?;
            }
            self.record(MutationRecord::child_list(id));
        }
        self.run_reactions(queue);
        Ok(())
    }

    /// Invoke queued reactions; no borrow is held across a callback
    fn run_reactions(&self, mut queue: CallbackQueue) {
        for info in queue.drain() {
            let instance = self.instances.borrow().get(&info.element_id).cloned();
            let Some(instance) = instance else {
                continue;
            };
            match info.callback {
                LifecycleCallback::Connected => instance.connected(),
                LifecycleCallback::Disconnected => instance.disconnected(),
                LifecycleCallback::AttributeChanged => instance.attribute_changed(
                    info.attribute_name.as_deref().unwrap_or_default(),
                    info.old_value.as_deref(),
                    info.new_value.as_deref(),
                ),
            }
        }
    }
}

fn element_mut(tree: &mut DomTree, id: NodeId) -> DomResult<&mut crate::ElementData> {
    let node = tree.get_mut(id).ok_or(DomError::NotFound(id))?;
    node.as_element_mut().ok_or(DomError::NotAnElement(id))
}

/// Weak handle to an element of a `Document`
#[derive(Clone)]
pub struct ElementRef {
    doc: Weak<DocumentInner>,
    id: NodeId,
}

impl ElementRef {
    /// Node id of this element
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Owning document, if still alive
    pub fn document(&self) -> Option<Document> {
        self.doc.upgrade().map(|inner| Document { inner })
    }

    fn with_element<T>(&self, f: impl FnOnce(&crate::ElementData) -> T) -> Option<T> {
        let doc = self.doc.upgrade()?;
        let tree = doc.tree.borrow();
        tree.element(self.id).map(f)
    }

    /// Lowercased tag name
    pub fn tag_name(&self) -> Option<String> {
        self.with_element(|e| e.tag.clone())
    }

    /// Get attribute value
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.with_element(|e| e.get_attr(name).map(str::to_string))
            .flatten()
    }

    /// Check if attribute exists
    pub fn has_attribute(&self, name: &str) -> bool {
        self.with_element(|e| e.attrs.has_attribute(name))
            .unwrap_or(false)
    }

    /// Attribute names in insertion order
    pub fn attribute_names(&self) -> Vec<String> {
        self.with_element(|e| e.attrs.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Set attribute; observed attributes of custom elements notify synchronously
    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        let doc = self.doc.upgrade().ok_or(DomError::NotFound(self.id))?;
        doc.set_attribute(self.id, name, value)
    }

    /// Remove attribute; a no-op if absent
    pub fn remove_attribute(&self, name: &str) -> DomResult<()> {
        let doc = self.doc.upgrade().ok_or(DomError::NotFound(self.id))?;
        doc.remove_attribute(self.id, name)
    }

    /// Child nodes in tree order
    pub fn children(&self) -> Vec<NodeId> {
        self.doc
            .upgrade()
            .map(|doc| doc.tree.borrow().children(self.id).to_vec())
            .unwrap_or_default()
    }

    /// Append a child node
    pub fn append_child(&self, child: NodeId) -> DomResult<()> {
        let doc = self.doc.upgrade().ok_or(DomError::NotFound(self.id))?;
        doc.append_child(self.id, child)
    }

    /// Concatenated descendant text
    pub fn text_content(&self) -> String {
        self.doc
            .upgrade()
            .map(|doc| doc.tree.borrow().text_content(self.id))
            .unwrap_or_default()
    }

    /// Replace all children with a single text node (none if `text` is empty)
    pub fn set_text_content(&self, text: &str) -> DomResult<()> {
        let doc = self.doc.upgrade().ok_or(DomError::NotFound(self.id))?;
        doc.set_text_content(self.id, text)
    }

    /// Whether the element is in its document
    pub fn is_connected(&self) -> bool {
        self.doc
            .upgrade()
            .is_some_and(|doc| doc.tree.borrow().is_connected(self.id))
    }
}

impl PartialEq for ElementRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.doc, &other.doc)
    }
}

impl Eq for ElementRef {}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.id).finish()
    }
}
