//! Reactive Props Store
//!
//! An observable key/value store standing in for property interception:
//!
//! - `get` records the key when called inside a render scope
//!   (`begin_render_scope` / `end_render_scope`); scopes nest.
//! - `set` stores the value and, once an element is attached, notifies the
//!   attached observer, which updates and reflects synchronously before `set`
//!   returns. Writes before attachment only store.
//! - `reflect` mirrors observed keys onto host attributes following a closed
//!   set of `ReflectPolicy` variants.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use fos_dom::{DomResult, ElementRef};
use indexmap::IndexMap;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Key of a props entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropKey {
    /// String key; may be reflected to the attribute of the same name
    Name(String),
    /// Unique key that never maps to an attribute
    Symbol(Symbol),
}

/// Unique, never-reflected key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u64,
    description: Rc<str>,
}

impl Symbol {
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PropKey {
    /// Create a fresh symbol key; two calls never produce equal keys
    pub fn symbol(description: &str) -> Self {
        Self::Symbol(Symbol {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        })
    }

    /// Attribute name for string keys
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }
}

impl From<&str> for PropKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PropKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for PropKey {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<&PropKey> for PropKey {
    fn from(key: &PropKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => write!(f, "Symbol({})", symbol.description),
        }
    }
}

/// Value of a props entry
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness: `false`, `0`, `NaN`, `""`, null and undefined are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric coercion
    ///
    /// Text is trimmed and parsed, the empty string is `0`. Returns `None`
    /// for undefined and for text that is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Undefined => None,
            Self::Null => Some(0.0),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => Some(*n),
            Self::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Some(0.0)
                } else {
                    s.parse().ok()
                }
            }
        }
    }

    /// How this value is mirrored onto an attribute
    pub fn reflect_policy(&self) -> ReflectPolicy {
        match self {
            Self::Bool(b) => ReflectPolicy::PresenceFlag(*b),
            Self::Undefined => ReflectPolicy::Absent,
            other => ReflectPolicy::StringCoerced(other.to_string()),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for PropValue {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// Attribute reflection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectPolicy {
    /// Present with an empty value when true, removed when false
    PresenceFlag(bool),
    /// Removed
    Absent,
    /// Set to the value's string form
    StringCoerced(String),
}

impl ReflectPolicy {
    /// Attribute value this policy produces; `None` means absent
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::PresenceFlag(true) => Some(""),
            Self::PresenceFlag(false) | Self::Absent => None,
            Self::StringCoerced(value) => Some(value),
        }
    }

    /// Apply this policy to `attribute` on `host`
    ///
    /// An attribute already at the target value is left untouched.
    pub fn apply(&self, host: &ElementRef, attribute: &str) -> DomResult<()> {
        let target = self.target();
        if host.get_attribute(attribute).as_deref() == target {
            return Ok(());
        }
        match target {
            Some(value) => host.set_attribute(attribute, value),
            None => host.remove_attribute(attribute),
        }
    }
}

/// Receives notification of every write made after attachment
pub(crate) trait PropsObserver {
    fn prop_written(&self, key: &PropKey);
}

/// Reactive props store; clones share the same entries
#[derive(Clone, Default)]
pub struct Props {
    inner: Rc<PropsInner>,
}

#[derive(Default)]
struct PropsInner {
    values: RefCell<IndexMap<PropKey, PropValue>>,
    /// Read sets of the active render scopes, innermost last
    scopes: RefCell<Vec<HashSet<PropKey>>>,
    observer: RefCell<Option<Weak<dyn PropsObserver>>>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value; recorded as read when inside a render scope
    pub fn get(&self, key: impl Into<PropKey>) -> PropValue {
        let key = key.into();
        if let Some(scope) = self.inner.scopes.borrow_mut().last_mut() {
            scope.insert(key.clone());
        }
        self.peek(&key)
    }

    /// Current value without read tracking
    pub fn peek(&self, key: impl Into<PropKey>) -> PropValue {
        let key = key.into();
        self.inner.values.borrow().get(&key).cloned().unwrap_or_default()
    }

    /// Store `value`; after attachment this updates and reflects before returning
    pub fn set(&self, key: impl Into<PropKey>, value: impl Into<PropValue>) {
        let key = key.into();
        self.store(key.clone(), value.into());

        let observer = self.inner.observer.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(observer) = observer {
            observer.prop_written(&key);
        }
    }

    /// Write `f(current)` back to `key`
    pub fn update(&self, key: impl Into<PropKey>, f: impl FnOnce(PropValue) -> PropValue) {
        let key = key.into();
        let next = f(self.peek(&key));
        self.set(key, next);
    }

    /// Store without notifying
    pub(crate) fn store(&self, key: PropKey, value: PropValue) {
        self.inner.values.borrow_mut().insert(key, value);
    }

    pub fn contains_key(&self, key: impl Into<PropKey>) -> bool {
        self.inner.values.borrow().contains_key(&key.into())
    }

    pub fn len(&self) -> usize {
        self.inner.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values.borrow().is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<PropKey> {
        self.inner.values.borrow().keys().cloned().collect()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> Vec<(PropKey, PropValue)> {
        self.inner
            .values
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Start recording reads
    pub fn begin_render_scope(&self) {
        self.inner.scopes.borrow_mut().push(HashSet::new());
    }

    /// Stop recording reads and return the keys read since the matching begin
    pub fn end_render_scope(&self) -> HashSet<PropKey> {
        self.inner.scopes.borrow_mut().pop().unwrap_or_default()
    }

    pub(crate) fn attach(&self, observer: Weak<dyn PropsObserver>) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    /// Mirror every stored key listed in `observed` onto `host`
    pub fn reflect(&self, host: &ElementRef, observed: &[String]) {
        let pending: Vec<(String, ReflectPolicy)> = self
            .inner
            .values
            .borrow()
            .iter()
            .filter_map(|(key, value)| {
                let name = key.as_name()?;
                observed
                    .iter()
                    .any(|o| o == name)
                    .then(|| (name.to_string(), value.reflect_policy()))
            })
            .collect();

        for (name, policy) in pending {
            tracing::trace!("Reflecting {} as {:?} on {:?}", name, policy, host);
            if let Err(err) = policy.apply(host, &name) {
                tracing::warn!("Failed to reflect {}: {}", name, err);
            }
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.values.borrow().iter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::Document;
    use std::cell::Cell;

    struct CountingObserver {
        writes: Cell<usize>,
    }

    impl PropsObserver for CountingObserver {
        fn prop_written(&self, _key: &PropKey) {
            self.writes.set(self.writes.get() + 1);
        }
    }

    #[test]
    fn test_missing_key_is_undefined() {
        let props = Props::new();
        assert_eq!(props.get("nope"), PropValue::Undefined);
        assert!(!props.contains_key("nope"));
    }

    #[test]
    fn test_writes_before_attach_only_store() {
        let props = Props::new();
        props.set("open", true);
        props.set("count", 0);
        assert_eq!(props.get("open"), PropValue::Bool(true));
        assert_eq!(props.keys(), vec![PropKey::from("open"), PropKey::from("count")]);
    }

    #[test]
    fn test_attached_observer_sees_every_write() {
        let props = Props::new();
        let observer = Rc::new(CountingObserver { writes: Cell::new(0) });
        let weak: Weak<CountingObserver> = Rc::downgrade(&observer);
        props.attach(weak);

        props.set("a", 1);
        props.set("a", 1);
        props.update("b", |_| PropValue::Null);
        props.store("c".into(), PropValue::Null);
        assert_eq!(observer.writes.get(), 3);

        drop(observer);
        props.set("a", 2);
        assert_eq!(props.get("a"), PropValue::Number(2.0));
    }

    #[test]
    fn test_read_tracking_only_inside_scope() {
        let props = Props::new();
        props.set("count", 1);
        props.get("outside");

        props.begin_render_scope();
        props.get("count");
        props.peek("peeked");
        props.begin_render_scope();
        props.get("inner");
        let inner = props.end_render_scope();
        props.get("after-inner");
        let outer = props.end_render_scope();

        assert_eq!(inner, HashSet::from([PropKey::from("inner")]));
        assert_eq!(
            outer,
            HashSet::from([PropKey::from("count"), PropKey::from("after-inner")])
        );
        assert!(props.end_render_scope().is_empty());
    }

    #[test]
    fn test_reflect_policies() {
        assert_eq!(PropValue::Bool(true).reflect_policy(), ReflectPolicy::PresenceFlag(true));
        assert_eq!(PropValue::Bool(false).reflect_policy(), ReflectPolicy::PresenceFlag(false));
        assert_eq!(PropValue::Undefined.reflect_policy(), ReflectPolicy::Absent);
        assert_eq!(
            PropValue::Null.reflect_policy(),
            ReflectPolicy::StringCoerced("null".into())
        );
        assert_eq!(
            PropValue::Number(3.0).reflect_policy(),
            ReflectPolicy::StringCoerced("3".into())
        );
    }

    #[test]
    fn test_number_display() {
        assert_eq!(PropValue::Number(2.0).to_string(), "2");
        assert_eq!(PropValue::Number(-0.0).to_string(), "0");
        assert_eq!(PropValue::Number(1.5).to_string(), "1.5");
        assert_eq!(PropValue::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(PropValue::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(PropValue::Number(1e20).to_string(), "100000000000000000000");
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(PropValue::from("41").as_number(), Some(41.0));
        assert_eq!(PropValue::from("  2.5 ").as_number(), Some(2.5));
        assert_eq!(PropValue::from("").as_number(), Some(0.0));
        assert_eq!(PropValue::from("abc").as_number(), None);
        assert_eq!(PropValue::Undefined.as_number(), None);
        assert_eq!(PropValue::Bool(true).as_number(), Some(1.0));
        assert!(!PropValue::from("").is_truthy());
        assert!(PropValue::from("0").is_truthy());
        assert!(!PropValue::Number(f64::NAN).is_truthy());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(PropValue::from(None::<&str>), PropValue::Undefined);
        assert_eq!(PropValue::from(Some("x")), PropValue::Text("x".into()));
    }

    #[test]
    fn test_typed_accessors() {
        assert_eq!(PropValue::from(true).as_bool(), Some(true));
        assert_eq!(PropValue::from("true").as_bool(), None);
        assert_eq!(PropValue::from("label").as_str(), Some("label"));
        assert_eq!(PropValue::Number(1.0).as_str(), None);
        assert!(PropValue::default().is_undefined());
        assert!(!PropValue::Null.is_undefined());
    }

    #[test]
    fn test_symbols_are_unique_and_never_reflected() {
        let a = PropKey::symbol("state");
        let b = PropKey::symbol("state");
        assert_ne!(a, b);
        assert_eq!(a.as_name(), None);
        assert_eq!(a.to_string(), "Symbol(state)");
        match &a {
            PropKey::Symbol(symbol) => assert_eq!(symbol.description(), "state"),
            PropKey::Name(_) => panic!("expected a symbol key"),
        }

        let doc = Document::new();
        let host = doc.create_element("div");
        let props = Props::new();
        props.set(a.clone(), "hidden");
        props.set("label", "shown");
        props.set("internal", "kept");
        props.reflect(&host, &["label".to_string(), "state".to_string()]);

        assert_eq!(host.attribute_names(), vec!["label"]);
        assert_eq!(props.get(&a), PropValue::Text("hidden".into()));
    }

    #[test]
    fn test_reflect_applies_policies() {
        let doc = Document::new();
        let host = doc.create_element("div");
        host.set_attribute("gone", "x").unwrap();
        host.set_attribute("closed", "").unwrap();

        let props = Props::new();
        props.set("open", true);
        props.set("closed", false);
        props.set("gone", PropValue::Undefined);
        props.set("count", 7);
        let observed: Vec<String> = ["open", "closed", "gone", "count"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        props.reflect(&host, &observed);

        assert_eq!(host.get_attribute("open").as_deref(), Some(""));
        assert!(!host.has_attribute("closed"));
        assert!(!host.has_attribute("gone"));
        assert_eq!(host.get_attribute("count").as_deref(), Some("7"));
    }

    #[test]
    fn test_reflect_skips_unchanged_attributes() {
        let doc = Document::new();
        let host = doc.create_element("div");
        let props = Props::new();
        props.set("open", true);
        props.set("title", "a");
        let observed = vec!["open".to_string(), "title".to_string()];
        props.reflect(&host, &observed);

        doc.record_mutations(true);
        props.reflect(&host, &observed);
        assert!(doc.take_mutation_records().is_empty());

        props.set("title", "b");
        props.reflect(&host, &observed);
        let records = doc.take_mutation_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attribute_name.as_deref(), Some("title"));
    }
}
