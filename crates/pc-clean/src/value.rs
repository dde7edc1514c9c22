//! Value model for payload trees.
//!
//! Input payloads are stored in an owning arena ([`Tree`]). Composite values
//! (sequences and mappings) receive a stable [`NodeId`] when they are
//! allocated; reusing a handle expresses shared references and cycles, and
//! the cleaner uses the handle as the identity of a composite.
//!
//! Cleaning produces a [`Cleaned`] tree, which is owned and acyclic.

use encoding_rs::Encoding;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

pub use serde_json::Number;

/// Handle to a composite node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Failure reported by an opaque value's text conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The conversion failed.
    #[error("render failed: {0}")]
    Raised(String),

    /// The conversion ran out of recursion depth.
    #[error("render exceeded recursion depth")]
    Overflow,
}

/// Text conversion for values the cleaner cannot inspect directly.
///
/// Implementations must be free of side effects: the cleaner may call
/// `render` at most once per occurrence and discards nothing but the text.
pub trait Render: Send + Sync {
    /// Produce the text form of the value.
    fn render(&self) -> Result<String, RenderError>;
}

struct FnRender<F>(F);

impl<F> Render for FnRender<F>
where
    F: Fn() -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self) -> Result<String, RenderError> {
        (self.0)()
    }
}

struct DisplayRender<T>(T);

impl<T> Render for DisplayRender<T>
where
    T: fmt::Display + Send + Sync,
{
    fn render(&self) -> Result<String, RenderError> {
        Ok(self.0.to_string())
    }
}

/// A value that is only observable through its text rendering.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Render>);

impl Opaque {
    /// Wrap a [`Render`] implementation.
    pub fn new<R: Render + 'static>(render: R) -> Self {
        Self(Arc::new(render))
    }

    /// Wrap a rendering closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<String, RenderError> + Send + Sync + 'static,
    {
        Self::new(FnRender(f))
    }

    /// Wrap any `Display` value; its rendering never fails.
    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::new(DisplayRender(value))
    }

    /// Render the value to text.
    ///
    /// A panic inside the implementation is reported as [`RenderError::Raised`].
    pub fn render(&self) -> Result<String, RenderError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.0.render())) {
            Ok(result) => result,
            Err(_) => Err(RenderError::Raised("render panicked".to_string())),
        }
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

/// String data together with what is known about its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Text {
    /// Well-formed text in the canonical encoding.
    Utf8(String),
    /// Bytes declared to be in `encoding`; they may be malformed.
    Encoded {
        bytes: Vec<u8>,
        encoding: &'static Encoding,
    },
    /// Bytes with no encoding metadata at all.
    Raw(Vec<u8>),
}

impl Text {
    /// Bytes declared under `encoding`.
    pub fn encoded(bytes: impl Into<Vec<u8>>, encoding: &'static Encoding) -> Self {
        Text::Encoded {
            bytes: bytes.into(),
            encoding,
        }
    }

    /// Bytes without encoding metadata.
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Text::Raw(bytes.into())
    }

    /// The text, if it is already canonical.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Text::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Declared encoding, if any. Canonical text reports UTF-8.
    pub fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            Text::Utf8(_) => Some(encoding_rs::UTF_8),
            Text::Encoded { encoding, .. } => Some(*encoding),
            Text::Raw(_) => None,
        }
    }

    /// Lossy UTF-8 view; used at serialization boundaries only.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Text::Utf8(s) => Cow::Borrowed(s),
            Text::Encoded { bytes, encoding } => encoding.decode_without_bom_handling(bytes).0,
            Text::Raw(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text::Utf8(s)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::Utf8(s.to_string())
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// Mapping key. Keys are always reduced to text before use.
#[derive(Debug, Clone)]
pub enum Key {
    Text(String),
    Opaque(Opaque),
}

impl Key {
    /// Text form of the key.
    pub fn to_text(&self) -> Result<String, RenderError> {
        match self {
            Key::Text(s) => Ok(s.clone()),
            Key::Opaque(opaque) => opaque.render(),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<Opaque> for Key {
    fn from(opaque: Opaque) -> Self {
        Key::Opaque(opaque)
    }
}

/// A value in a payload tree.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Text),
    Sequence(NodeId),
    Mapping(NodeId),
    Opaque(Opaque),
}

impl Value {
    /// A float value; non-finite floats have no representation and become `Null`.
    pub fn float(f: f64) -> Self {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }

    /// Arena handle of a composite value.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Sequence(id) | Value::Mapping(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Text> for Value {
    fn from(text: Text) -> Self {
        Value::String(text)
    }
}

impl From<Opaque> for Value {
    fn from(opaque: Opaque) -> Self {
        Value::Opaque(opaque)
    }
}

/// A composite node stored in a [`Tree`].
#[derive(Debug, Clone)]
pub enum Node {
    Sequence(Vec<Value>),
    Mapping(Vec<(Key, Value)>),
}

/// Owning arena for a payload tree.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Value,
}

impl Tree {
    /// An empty tree whose root is `Null`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Replace the root value.
    pub fn set_root(&mut self, root: Value) {
        self.root = root;
    }

    /// Builder form of [`Tree::set_root`].
    pub fn with_root(mut self, root: Value) -> Self {
        self.root = root;
        self
    }

    /// Number of composite nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no composite nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a composite node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate a sequence holding `items`.
    pub fn add_sequence(&mut self, items: Vec<Value>) -> Value {
        Value::Sequence(self.alloc(Node::Sequence(items)))
    }

    /// Allocate a mapping holding `entries`.
    pub fn add_mapping<K: Into<Key>>(&mut self, entries: Vec<(K, Value)>) -> Value {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Mapping(self.alloc(Node::Mapping(entries)))
    }

    /// Allocate an empty sequence.
    pub fn new_sequence(&mut self) -> Value {
        self.add_sequence(Vec::new())
    }

    /// Allocate an empty mapping.
    pub fn new_mapping(&mut self) -> Value {
        Value::Mapping(self.alloc(Node::Mapping(Vec::new())))
    }

    /// Append `item` to the sequence `target`.
    ///
    /// Returns `false` when `target` is not a sequence of this tree.
    pub fn push(&mut self, target: &Value, item: Value) -> bool {
        let Value::Sequence(id) = target else {
            return false;
        };
        match self.nodes.get_mut(id.0) {
            Some(Node::Sequence(items)) => {
                items.push(item);
                true
            }
            _ => false,
        }
    }

    /// Set `key` to `value` in the mapping `target`.
    ///
    /// An existing text key with the same text is overwritten in place.
    /// Returns `false` when `target` is not a mapping of this tree.
    pub fn insert(&mut self, target: &Value, key: impl Into<Key>, value: Value) -> bool {
        let Value::Mapping(id) = target else {
            return false;
        };
        let Some(Node::Mapping(entries)) = self.nodes.get_mut(id.0) else {
            return false;
        };

        let key = key.into();
        if let Key::Text(ref text) = key {
            let existing = entries
                .iter_mut()
                .find(|(k, _)| matches!(k, Key::Text(t) if t == text));
            if let Some(entry) = existing {
                entry.1 = value;
                return true;
            }
        }
        entries.push((key, value));
        true
    }

    /// Build a tree from a JSON document. Object key order is preserved.
    pub fn from_json(json: &JsonValue) -> Self {
        let mut tree = Tree::new();
        let root = tree.import_json(json);
        tree.root = root;
        tree
    }

    fn import_json(&mut self, json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.clone()),
            JsonValue::String(s) => Value::String(Text::Utf8(s.clone())),
            JsonValue::Array(items) => {
                let items = items.iter().map(|item| self.import_json(item)).collect();
                self.add_sequence(items)
            }
            JsonValue::Object(map) => {
                let entries: Vec<(Key, Value)> = map
                    .iter()
                    .map(|(k, v)| (Key::Text(k.clone()), self.import_json(v)))
                    .collect();
                self.add_mapping(entries)
            }
        }
    }

    /// Build a tree from a cleaned tree, so it can be cleaned again.
    ///
    /// Shared composites in the cleaned tree stay shared in the new arena.
    pub fn from_cleaned(cleaned: &Cleaned) -> Self {
        let mut tree = Tree::new();
        let mut imported = HashMap::new();
        let root = tree.import_cleaned(cleaned, &mut imported);
        tree.root = root;
        tree
    }

    fn import_cleaned(
        &mut self,
        cleaned: &Cleaned,
        imported: &mut HashMap<*const u8, Value>,
    ) -> Value {
        let (storage, value) = match cleaned {
            Cleaned::Null => return Value::Null,
            Cleaned::Bool(b) => return Value::Bool(*b),
            Cleaned::Number(n) => return Value::Number(n.clone()),
            Cleaned::String(text) => return Value::String(text.clone()),
            Cleaned::Sequence(items) => {
                let storage = Arc::as_ptr(items) as *const u8;
                if let Some(value) = imported.get(&storage) {
                    return value.clone();
                }
                let items = items
                    .iter()
                    .map(|item| self.import_cleaned(item, imported))
                    .collect();
                (storage, self.add_sequence(items))
            }
            Cleaned::Mapping(entries) => {
                let storage = Arc::as_ptr(entries) as *const u8;
                if let Some(value) = imported.get(&storage) {
                    return value.clone();
                }
                let entries: Vec<(Key, Value)> = entries
                    .iter()
                    .map(|(k, v)| (Key::Text(k.clone()), self.import_cleaned(v, imported)))
                    .collect();
                (storage, self.add_mapping(entries))
            }
        };
        imported.insert(storage, value.clone());
        value
    }
}

/// Output of the cleaner: an acyclic tree with text keys.
///
/// Composite children are reference-counted. A node referenced more than
/// once in the input is cleaned once, and every reference shares that result,
/// so cloning is cheap and output size follows input size.
#[derive(Debug, Clone, PartialEq)]
pub enum Cleaned {
    Null,
    Bool(bool),
    Number(Number),
    String(Text),
    Sequence(Arc<[Cleaned]>),
    Mapping(Arc<[(String, Cleaned)]>),
}

impl Cleaned {
    /// A marker string value.
    pub fn marker(marker: &str) -> Self {
        Cleaned::String(Text::Utf8(marker.to_string()))
    }

    /// Whether this value is exactly the given marker.
    pub fn is_marker(&self, marker: &str) -> bool {
        self.as_str() == Some(marker)
    }

    /// Canonical string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cleaned::String(text) => text.as_str(),
            _ => None,
        }
    }

    /// Look up a key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Cleaned> {
        match self {
            Cleaned::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Element of a sequence.
    pub fn index(&self, i: usize) -> Option<&Cleaned> {
        match self {
            Cleaned::Sequence(items) => items.get(i),
            _ => None,
        }
    }

    /// Whether both values are the same shared composite.
    pub fn shares_storage_with(&self, other: &Cleaned) -> bool {
        match (self, other) {
            (Cleaned::Sequence(a), Cleaned::Sequence(b)) => Arc::ptr_eq(a, b),
            (Cleaned::Mapping(a), Cleaned::Mapping(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert to a JSON document. Non-canonical text is decoded lossily.
    ///
    /// JSON has no sharing: every reference to a shared composite is written
    /// out in full.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Cleaned::Null => JsonValue::Null,
            Cleaned::Bool(b) => JsonValue::Bool(*b),
            Cleaned::Number(n) => JsonValue::Number(n.clone()),
            Cleaned::String(text) => JsonValue::String(text.to_string_lossy().into_owned()),
            Cleaned::Sequence(items) => JsonValue::Array(items.iter().map(Cleaned::to_json).collect()),
            Cleaned::Mapping(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Cleaned {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cleaned::Null => serializer.serialize_unit(),
            Cleaned::Bool(b) => serializer.serialize_bool(*b),
            Cleaned::Number(n) => n.serialize(serializer),
            Cleaned::String(text) => text.serialize(serializer),
            Cleaned::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Cleaned::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}
