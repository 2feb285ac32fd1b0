//! Serime Test Utilities
//!
//! Shared helpers for the Serime workspace: graph builders for assembling
//! test values and the cycle-safe structural comparator.

#![deny(unsafe_code)]

pub mod compare;

pub use compare::{structural_eq, Comparison};

use serime_format::value::Property;
use serime_format::{PropKey, Value};

/// Builder for object values with common property patterns.
pub struct ObjectBuilder {
    entries: Vec<(PropKey, Property)>,
}

impl ObjectBuilder {
    /// A fresh builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a string property.
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.entries
            .push((PropKey::from(key), Property::plain(Value::string(value))));
        self
    }

    /// Add a number property.
    pub fn number(mut self, key: &str, value: f64) -> Self {
        self.entries
            .push((PropKey::from(key), Property::plain(Value::Number(value))));
        self
    }

    /// Add a boolean property.
    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.entries
            .push((PropKey::from(key), Property::plain(Value::Bool(value))));
        self
    }

    /// Add a null property.
    pub fn null(mut self, key: &str) -> Self {
        self.entries
            .push((PropKey::from(key), Property::plain(Value::Null)));
        self
    }

    /// Add a property holding any value.
    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.entries
            .push((PropKey::from(key), Property::plain(value)));
        self
    }

    /// Add a property with an explicit descriptor.
    pub fn prop(mut self, key: PropKey, prop: Property) -> Self {
        self.entries.push((key, prop));
        self
    }

    /// Build the object value.
    pub fn build(self) -> Value {
        let obj = Value::object();
        if let Value::Object(slot) = &obj {
            let mut slot = slot.borrow_mut();
            for (key, prop) in self.entries {
                slot.insert(key, prop);
            }
        }
        obj
    }
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An array value from plain members.
pub fn array_of(values: Vec<Value>) -> Value {
    let arr = Value::array();
    if let Value::Array(slot) = &arr {
        slot.borrow_mut().items = values.into_iter().map(Property::plain).collect();
    }
    arr
}

/// A map value from key/value pairs.
pub fn map_of(pairs: Vec<(Value, Value)>) -> Value {
    let map = Value::map();
    if let Value::Map(slot) = &map {
        slot.borrow_mut().entries = pairs;
    }
    map
}

/// A set value from members.
pub fn set_of(members: Vec<Value>) -> Value {
    let set = Value::set();
    if let Value::Set(slot) = &set {
        slot.borrow_mut().members = members;
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_builder() {
        let obj = ObjectBuilder::new()
            .string("name", "test")
            .number("age", 25.0)
            .bool("active", true)
            .build();
        let Value::Object(slot) = &obj else {
            panic!("expected object")
        };
        assert_eq!(slot.borrow().entries.len(), 3);
    }

    #[test]
    fn test_collection_helpers() {
        assert!(matches!(array_of(vec![Value::Null]), Value::Array(_)));
        assert!(matches!(set_of(vec![]), Value::Set(_)));
        let map = map_of(vec![(Value::Bool(true), Value::Null)]);
        let Value::Map(slot) = &map else {
            panic!("expected map")
        };
        assert_eq!(slot.borrow().entries.len(), 1);
    }
}
