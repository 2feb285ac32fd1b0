//! The dynamic value model
//!
//! Values form a graph: entried values (object, array, map, set, custom)
//! are shared slots behind `Rc<RefCell<…>>`, so the same instance can be
//! reachable through several paths and graphs may contain cycles. Instance
//! identity is `Rc` pointer identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{Result, SerimeError};
use crate::flags::{default_property_flags, AccessFlag, FlagSet, PropertyFlag};
use crate::symbol::WellKnownSymbol;
use crate::tag::TypeTag;

/// Shared object slot
pub type ObjectRef = Rc<RefCell<ObjectSlot>>;
/// Shared array slot
pub type ArrayRef = Rc<RefCell<ArraySlot>>;
/// Shared map slot
pub type MapRef = Rc<RefCell<MapSlot>>;
/// Shared set slot
pub type SetRef = Rc<RefCell<SetSlot>>;
/// Shared custom-class instance slot
pub type CustomRef = Rc<RefCell<CustomSlot>>;
/// Shared function value
pub type FunctionRef = Rc<FunctionData>;

/// A value in the Serime universe.
#[derive(Clone)]
pub enum Value {
    /// Null singleton
    Null,
    /// Undefined singleton
    Undefined,
    /// Boolean
    Bool(bool),
    /// IEEE double, including NaN, ±Infinity and -0
    Number(f64),
    /// Arbitrary-precision integer
    BigInt(BigInt),
    /// Unicode string
    Str(String),
    /// Well-known named symbol
    Symbol(WellKnownSymbol),
    /// Function with a name and reproducible source text
    Function(FunctionRef),
    /// Timestamp
    Date(DateTime<Utc>),
    /// Key→property mapping
    Object(ObjectRef),
    /// Ordered sequence
    Array(ArrayRef),
    /// Mapping with arbitrary keys
    Map(MapRef),
    /// Unique values
    Set(SetRef),
    /// Instance of a user-supplied custom class
    Custom(CustomRef),
}

/// A property key: a string or a well-known symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropKey {
    /// Named property
    Str(String),
    /// Well-known symbol property
    Symbol(WellKnownSymbol),
}

impl From<&str> for PropKey {
    fn from(name: &str) -> Self {
        PropKey::Str(name.to_string())
    }
}

/// A property: a value plus its descriptor flags.
#[derive(Debug, Clone)]
pub struct Property {
    /// The property value
    pub value: Value,
    /// Descriptor flags
    pub flags: FlagSet<PropertyFlag>,
}

impl Property {
    /// A plain data property (configurable, enumerable, writable).
    pub fn plain(value: Value) -> Self {
        Self {
            value,
            flags: default_property_flags(),
        }
    }

    /// A property with explicit descriptor flags.
    pub fn with_flags(value: Value, flags: FlagSet<PropertyFlag>) -> Self {
        Self { value, flags }
    }
}

/// Key→property mapping with accessibility flags.
#[derive(Debug, Default)]
pub struct ObjectSlot {
    /// Own properties, in insertion order
    pub entries: IndexMap<PropKey, Property>,
    /// Object accessibility flags
    pub access: FlagSet<AccessFlag>,
}

/// Ordered sequence of properties with accessibility flags.
#[derive(Debug, Default)]
pub struct ArraySlot {
    /// Elements, in index order
    pub items: Vec<Property>,
    /// Object accessibility flags
    pub access: FlagSet<AccessFlag>,
}

/// Ordered key/value pairs with accessibility flags.
#[derive(Debug, Default)]
pub struct MapSlot {
    /// Pairs, in insertion order
    pub entries: Vec<(Value, Value)>,
    /// Object accessibility flags
    pub access: FlagSet<AccessFlag>,
}

/// Ordered unique members with accessibility flags.
#[derive(Debug, Default)]
pub struct SetSlot {
    /// Members, in insertion order
    pub members: Vec<Value>,
    /// Object accessibility flags
    pub access: FlagSet<AccessFlag>,
}

/// An instance of a user-supplied custom class.
#[derive(Debug)]
pub struct CustomSlot {
    /// The class name carried by the dependency table
    pub class: String,
    /// Own properties, in insertion order
    pub entries: IndexMap<PropKey, Property>,
    /// Object accessibility flags
    pub access: FlagSet<AccessFlag>,
}

/// A function value: name plus source text.
#[derive(Debug, PartialEq, Eq)]
pub struct FunctionData {
    /// The function name (may be empty)
    pub name: String,
    /// The full source text
    pub source: String,
}

impl ObjectSlot {
    /// Install or replace a property.
    pub fn insert(&mut self, key: PropKey, prop: Property) {
        self.entries.insert(key, prop);
    }

    /// Read a property value.
    pub fn get(&self, key: &PropKey) -> Option<&Property> {
        self.entries.get(key)
    }

    /// Fetch a property's descriptor flags; absent properties are an
    /// encode-side error.
    pub fn descriptor(&self, key: &PropKey) -> Result<FlagSet<PropertyFlag>> {
        self.entries.get(key).map(|p| p.flags).ok_or_else(|| {
            SerimeError::EncodePropertyMissing(format!("no property {key:?} on object"))
        })
    }
}

impl CustomSlot {
    /// An uninitialized instance of the given class.
    pub fn uninitialized(class: &str) -> Self {
        Self {
            class: class.to_string(),
            entries: IndexMap::new(),
            access: FlagSet::new(),
        }
    }

    /// Install or replace a property.
    pub fn insert(&mut self, key: PropKey, prop: Property) {
        self.entries.insert(key, prop);
    }
}

impl ArraySlot {
    /// Install a property at an index, filling any gap with undefined.
    pub fn set_index(&mut self, index: usize, prop: Property) {
        while self.items.len() < index {
            self.items.push(Property::plain(Value::Undefined));
        }
        if index < self.items.len() {
            self.items[index] = prop;
        } else {
            self.items.push(prop);
        }
    }
}

impl Value {
    /// A fresh empty object.
    pub fn object() -> Self {
        Value::Object(Rc::new(RefCell::new(ObjectSlot::default())))
    }

    /// A fresh empty array.
    pub fn array() -> Self {
        Value::Array(Rc::new(RefCell::new(ArraySlot::default())))
    }

    /// A fresh empty map.
    pub fn map() -> Self {
        Value::Map(Rc::new(RefCell::new(MapSlot::default())))
    }

    /// A fresh empty set.
    pub fn set() -> Self {
        Value::Set(Rc::new(RefCell::new(SetSlot::default())))
    }

    /// A fresh uninitialized custom instance.
    pub fn custom(class: &str) -> Self {
        Value::Custom(Rc::new(RefCell::new(CustomSlot::uninitialized(class))))
    }

    /// A string value.
    pub fn string(text: impl Into<String>) -> Self {
        Value::Str(text.into())
    }

    /// A function value.
    pub fn function(name: impl Into<String>, source: impl Into<String>) -> Self {
        Value::Function(Rc::new(FunctionData {
            name: name.into(),
            source: source.into(),
        }))
    }

    /// The type tag of this value; custom instances need the encoder's
    /// dependency table for their index, so they report through
    /// [`Value::custom_class`] instead.
    pub fn native_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Null => Some(TypeTag::Null),
            Value::Undefined => Some(TypeTag::Undefined),
            Value::Bool(_) => Some(TypeTag::Bool),
            Value::Number(_) => Some(TypeTag::Number),
            Value::BigInt(_) => Some(TypeTag::BigInt),
            Value::Str(_) => Some(TypeTag::Str),
            Value::Symbol(_) => Some(TypeTag::Symbol),
            Value::Function(_) => Some(TypeTag::Function),
            Value::Date(_) => Some(TypeTag::Date),
            Value::Object(_) => Some(TypeTag::Object),
            Value::Array(_) => Some(TypeTag::Array),
            Value::Map(_) => Some(TypeTag::Map),
            Value::Set(_) => Some(TypeTag::Set),
            Value::Custom(_) => None,
        }
    }

    /// The class name of a custom instance.
    pub fn custom_class(&self) -> Option<String> {
        match self {
            Value::Custom(slot) => Some(slot.borrow().class.clone()),
            _ => None,
        }
    }

    /// Stable address of a shared slot, or `None` for by-value variants.
    pub fn instance_addr(&self) -> Option<usize> {
        match self {
            Value::Object(r) => Some(Rc::as_ptr(r) as usize),
            Value::Array(r) => Some(Rc::as_ptr(r) as usize),
            Value::Map(r) => Some(Rc::as_ptr(r) as usize),
            Value::Set(r) => Some(Rc::as_ptr(r) as usize),
            Value::Custom(r) => Some(Rc::as_ptr(r) as usize),
            Value::Function(r) => Some(Rc::as_ptr(r) as usize),
            _ => None,
        }
    }

    /// True when both values are the same shared instance.
    pub fn same_instance(&self, other: &Value) -> bool {
        matches!((self.instance_addr(), other.instance_addr()),
            (Some(a), Some(b)) if a == b)
    }

    /// Accessibility flag bits of an entried value, `None` otherwise.
    pub fn accessibility(&self) -> Option<FlagSet<AccessFlag>> {
        match self {
            Value::Object(r) => Some(r.borrow().access),
            Value::Array(r) => Some(r.borrow().access),
            Value::Map(r) => Some(r.borrow().access),
            Value::Set(r) => Some(r.borrow().access),
            Value::Custom(r) => Some(r.borrow().access),
            _ => None,
        }
    }

    /// Install accessibility flags on an entried value. Non-entried values
    /// ignore the call.
    pub fn set_accessibility(&self, access: FlagSet<AccessFlag>) {
        match self {
            Value::Object(r) => r.borrow_mut().access = access,
            Value::Array(r) => r.borrow_mut().access = access,
            Value::Map(r) => r.borrow_mut().access = access,
            Value::Set(r) => r.borrow_mut().access = access,
            Value::Custom(r) => r.borrow_mut().access = access,
            _ => {}
        }
    }

    /// Frozen at the host level.
    pub fn is_frozen(&self) -> bool {
        self.accessibility()
            .map(|a| a.has(&[AccessFlag::Frozen]))
            .unwrap_or(false)
    }

    /// Sealed at the host level (frozen implies sealed).
    pub fn is_sealed(&self) -> bool {
        self.accessibility()
            .map(|a| a.has(&[AccessFlag::Sealed]) || a.has(&[AccessFlag::Frozen]))
            .unwrap_or(false)
    }

    /// Open for new properties.
    pub fn is_extensible(&self) -> bool {
        self.accessibility()
            .map(|a| {
                !a.has(&[AccessFlag::NonExtensible])
                    && !a.has(&[AccessFlag::Sealed])
                    && !a.has(&[AccessFlag::Frozen])
            })
            .unwrap_or(true)
    }

    /// Short variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Date(_) => "date",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Custom(_) => "custom",
        }
    }
}

// Shallow by construction: a derived Debug would recurse forever on cyclic
// graphs.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Undefined => write!(f, "Undefined"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::BigInt(n) => write!(f, "BigInt({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(s) => write!(f, "Symbol({})", s.name()),
            Value::Function(func) => write!(f, "Function({:?})", func.name),
            Value::Date(d) => write!(f, "Date({d})"),
            Value::Object(r) => write!(f, "Object({} entries)", r.borrow().entries.len()),
            Value::Array(r) => write!(f, "Array({} items)", r.borrow().items.len()),
            Value::Map(r) => write!(f, "Map({} entries)", r.borrow().entries.len()),
            Value::Set(r) => write!(f, "Set({} members)", r.borrow().members.len()),
            Value::Custom(r) => {
                let slot = r.borrow();
                write!(f, "Custom({}, {} entries)", slot.class, slot.entries.len())
            }
        }
    }
}
