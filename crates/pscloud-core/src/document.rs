//! Defensive navigation over untyped response documents.
//!
//! Backend responses are decoded into `serde_json::Value` and never into typed
//! structs: the provider has changed field names and shapes between releases, and
//! one malformed nested field must not abort a whole scrape. Every lookup goes
//! through [`get`] or the [`Node`] view, which resolve to `None` on a missing key,
//! an out-of-range index, the wrong container kind, or a leaf of the wrong type.

use serde_json::{Map, Value};

/// One step of a navigation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'p> {
    /// Object member lookup.
    Key(&'p str),
    /// Array element lookup.
    Index(usize),
}

impl<'p> From<&'p str> for Step<'p> {
    fn from(key: &'p str) -> Self {
        Step::Key(key)
    }
}

/// A typed leaf that can be extracted from a document node.
pub trait Leaf<'a>: Sized {
    fn from_value(value: &'a Value) -> Option<Self>;
}

impl<'a> Leaf<'a> for &'a Value {
    fn from_value(value: &'a Value) -> Option<Self> {
        Some(value)
    }
}

impl<'a> Leaf<'a> for f64 {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_f64()
    }
}

impl<'a> Leaf<'a> for i64 {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_i64()
    }
}

impl<'a> Leaf<'a> for bool {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_bool()
    }
}

impl<'a> Leaf<'a> for &'a str {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> Leaf<'a> for &'a [Value] {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_array().map(Vec::as_slice)
    }
}

impl<'a> Leaf<'a> for &'a Map<String, Value> {
    fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object()
    }
}

/// Resolves `path` inside `document` and extracts a typed leaf.
///
/// Returns `None` as soon as any step does not resolve; never panics.
pub fn get<'a, T: Leaf<'a>>(document: &'a Value, path: &[Step<'_>]) -> Option<T> {
    Node::new(document).at(path).get()
}

/// A possibly-absent position inside a document.
///
/// Navigation on an absent node stays absent, so chains like
/// `node.key("tariff").key("ramGb").f64()` need no intermediate checks.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    value: Option<&'a Value>,
}

impl<'a> Node<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value: Some(value) }
    }

    /// An absent node.
    pub fn absent() -> Self {
        Self { value: None }
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// Object member lookup.
    pub fn key(self, key: &str) -> Self {
        Self {
            value: self.value.and_then(|v| v.as_object()).and_then(|m| m.get(key)),
        }
    }

    /// Array element lookup.
    pub fn index(self, index: usize) -> Self {
        Self {
            value: self
                .value
                .and_then(|v| v.as_array())
                .and_then(|a| a.get(index)),
        }
    }

    pub fn at(self, path: &[Step<'_>]) -> Self {
        path.iter().fold(self, |node, step| match *step {
            Step::Key(key) => node.key(key),
            Step::Index(index) => node.index(index),
        })
    }

    pub fn get<T: Leaf<'a>>(self) -> Option<T> {
        self.value.and_then(T::from_value)
    }

    pub fn value(self) -> Option<&'a Value> {
        self.value
    }

    pub fn f64(self) -> Option<f64> {
        self.get()
    }

    pub fn str(self) -> Option<&'a str> {
        self.get()
    }

    pub fn bool(self) -> Option<bool> {
        self.get()
    }

    pub fn array(self) -> Option<&'a [Value]> {
        self.get()
    }

    pub fn object(self) -> Option<&'a Map<String, Value>> {
        self.get()
    }

    /// Array elements that are objects, skipping anything else.
    pub fn objects(self) -> impl Iterator<Item = Node<'a>> {
        self.array()
            .unwrap_or_default()
            .iter()
            .filter(|v| v.is_object())
            .map(Node::new)
    }

    /// Renders an identity field as a label value.
    ///
    /// Accepts strings and integral numbers (ids have flipped between the two
    /// in the provider's API); anything else is absent.
    pub fn label(self) -> Option<String> {
        match self.value? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => Some(i.to_string()),
                (_, Some(u), _) => Some(u.to_string()),
                (_, _, Some(f)) if f.fract() == 0.0 && f.is_finite() => {
                    Some(format!("{f:.0}"))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Like [`Node::label`] but treats an empty string as absent.
    pub fn non_empty_label(self) -> Option<String> {
        self.label().filter(|s| !s.is_empty())
    }
}
