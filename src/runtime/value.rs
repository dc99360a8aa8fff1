use std::{fmt, rc::Rc};

use crate::runtime::{exception::Exception, object::Inspectable, resource::Resource};

/// Runtime value handed to the dumper.
///
/// ## Sharing model
///
/// Heap-backed variants use `Rc` so cloning a value is O(1). Strings keep
/// their raw bytes: the dumper reports byte length and detects the encoding,
/// which is only meaningful when the bytes are not forced through UTF-8
/// first.
///
/// `Object` and `Exception` are the identity-bearing variants. Two clones of
/// the same `Rc` are the same object; two records with equal fields are not.
#[derive(Clone)]
pub enum Value {
    /// Absence of value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Raw byte string.
    Str(Rc<[u8]>),
    /// Ordered list, keyed implicitly by position.
    Seq(Rc<Vec<Value>>),
    /// Ordered key/value map.
    Map(Rc<Vec<(Key, Value)>>),
    /// Structured object exposing its fields through [`Inspectable`].
    Object(Rc<dyn Inspectable>),
    /// Exception value.
    Exception(Rc<Exception>),
    /// Opaque OS or library handle.
    Resource(Rc<Resource>),
}

/// Key of a [`Value::Map`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{}", v),
            Key::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl Value {
    /// Builds a string value from UTF-8 text.
    pub fn string(text: &str) -> Self {
        Value::Str(Rc::from(text.as_bytes()))
    }

    /// Builds a string value from raw bytes in any encoding.
    pub fn bytes(raw: &[u8]) -> Self {
        Value::Str(Rc::from(raw))
    }

    pub fn seq(items: Vec<Value>) -> Self {
        Value::Seq(Rc::new(items))
    }

    pub fn map<K: Into<Key>>(entries: Vec<(K, Value)>) -> Self {
        Value::Map(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn object<T: Inspectable + 'static>(object: Rc<T>) -> Self {
        Value::Object(object)
    }

    pub fn exception(exception: Exception) -> Self {
        Value::Exception(Rc::new(exception))
    }

    /// Returns the canonical type label used by short descriptions.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) | Value::Map(_) => "array",
            Value::Object(_) | Value::Exception(_) => "object",
            Value::Resource(_) => "resource",
        }
    }

    /// Number of entries for array-shaped values.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Seq(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Str(v) => write!(f, "Str({:?})", String::from_utf8_lossy(v)),
            Value::Seq(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            Value::Object(obj) => write!(f, "Object({})", obj.type_name()),
            Value::Exception(e) => write!(f, "Exception({})", e.type_name()),
            Value::Resource(r) => write!(f, "Resource({}; {})", r.identity(), r.kind()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(&value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::seq(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Resource> for Value {
    fn from(value: Resource) -> Self {
        Value::Resource(Rc::new(value))
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => {
                Value::seq(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(Rc::new(
                entries
                    .iter()
                    .map(|(k, v)| (Key::Str(k.clone()), Value::from(v)))
                    .collect(),
            )),
        }
    }
}
