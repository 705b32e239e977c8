use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// A single value in an item's component payload.
///
/// The set of shapes is closed on purpose: every variant has total equality
/// and a deterministic hash, so two payloads compare equal exactly when they
/// hold the same nested values. Floating point numbers are not representable
/// and are rejected when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ComponentValue>),
    Map(BTreeMap<String, ComponentValue>),
}

impl ComponentValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ComponentValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ComponentValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for ComponentValue {
    fn from(v: bool) -> Self {
        ComponentValue::Bool(v)
    }
}

impl From<i64> for ComponentValue {
    fn from(v: i64) -> Self {
        ComponentValue::Int(v)
    }
}

impl From<&str> for ComponentValue {
    fn from(v: &str) -> Self {
        ComponentValue::Str(v.to_string())
    }
}

impl From<String> for ComponentValue {
    fn from(v: String) -> Self {
        ComponentValue::Str(v)
    }
}

impl From<Vec<ComponentValue>> for ComponentValue {
    fn from(v: Vec<ComponentValue>) -> Self {
        ComponentValue::List(v)
    }
}

impl From<BTreeMap<String, ComponentValue>> for ComponentValue {
    fn from(v: BTreeMap<String, ComponentValue>) -> Self {
        ComponentValue::Map(v)
    }
}

/// Ordered component payload attached to an item (custom name, enchantments, tags...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Components(BTreeMap<String, ComponentValue>);

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ComponentValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ComponentValue>) -> Option<ComponentValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<ComponentValue> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ComponentValue)> {
        self.0.iter()
    }
}

impl fmt::Display for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        f.write_str("}")
    }
}
