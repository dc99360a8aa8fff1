use std::{cell::RefCell, fmt, rc::Rc};

use crate::runtime::value::Value;

/// Introspection capability for structured objects.
///
/// Types that want a field-wise dump implement this instead of relying on
/// reflection. `fields` must list every field the dump should show,
/// private state included, with inherited fields first.
pub trait Inspectable {
    /// Type name shown in the dump header.
    fn type_name(&self) -> &str;

    /// Ordered `(name, value)` pairs, parent fields first.
    fn fields(&self) -> Vec<(String, Value)>;

    /// Optional complete rendering of the object at the given depth.
    ///
    /// Returning `None` falls back to the field-wise dump.
    fn dump(&self, _depth: usize) -> Option<String> {
        None
    }
}

impl fmt::Debug for dyn Inspectable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ .. }}", self.type_name())
    }
}

/// General-purpose structured object with mutable fields.
///
/// Fields live in a `RefCell` so a shared record can be wired into a graph
/// after it has been wrapped in `Rc`, including back-edges to itself.
pub struct Record {
    type_name: String,
    fields: RefCell<Vec<(String, Value)>>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RefCell::new(Vec::new()),
        }
    }

    /// Creates a subtype record whose fields start with the parent's.
    pub fn extend(type_name: impl Into<String>, parent: &Record) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RefCell::new(parent.fields.borrow().clone()),
        }
    }

    /// Builder form of [`Record::set`].
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field. An existing field keeps its position.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }

    pub fn into_value(self) -> (Rc<Record>, Value) {
        let rc = Rc::new(self);
        let value = Value::Object(rc.clone());
        (rc, value)
    }
}

impl Inspectable for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn fields(&self) -> Vec<(String, Value)> {
        self.fields.borrow().clone()
    }
}
