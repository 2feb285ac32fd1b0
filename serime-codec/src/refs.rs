//! Reference management
//!
//! The encoder interns values so any instance (or primitive key) observed
//! more than once is declared exactly once (`@<id>=…`) and pointed to
//! thereafter (`#<id>`). A post-pass compacts the id space to the
//! declarations actually consumed. The decoder binds ids back to values as
//! holders are allocated, so cyclic pointers resolve.

use std::collections::{HashMap, HashSet};

use num_bigint::BigInt;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serime_format::{Result, SerimeError, Value, WellKnownSymbol};

// Raw `@`/`#` are structural: payload occurrences are escaped.
static REF_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\d+)=|#(\d+)").expect("ref pattern"));

/// Interning key mirroring the host's keyed-map semantics: shared slots by
/// pointer identity, primitives by value, numbers by bit pattern with NaN
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InternKey {
    /// Null singleton
    Null,
    /// Undefined singleton
    Undefined,
    /// Boolean by value
    Bool(bool),
    /// Number by bit pattern (all NaNs collapse to one key)
    NumberBits(u64),
    /// Big integer by value
    BigInt(BigInt),
    /// String by content
    Str(String),
    /// Symbol by table identity
    Symbol(WellKnownSymbol),
    /// Date by timestamp millis
    Date(i64),
    /// Shared slot by pointer identity
    Instance(usize),
}

/// The interning key for a value, or `None` when the value is exempt.
///
/// The number zero of either sign is exempt so `+0` and `-0` are never
/// collapsed into one declaration.
pub fn intern_key(value: &Value) -> Option<InternKey> {
    match value {
        Value::Null => Some(InternKey::Null),
        Value::Undefined => Some(InternKey::Undefined),
        Value::Bool(b) => Some(InternKey::Bool(*b)),
        Value::Number(n) => {
            if *n == 0.0 {
                None
            } else if n.is_nan() {
                Some(InternKey::NumberBits(f64::NAN.to_bits()))
            } else {
                Some(InternKey::NumberBits(n.to_bits()))
            }
        }
        Value::BigInt(n) => Some(InternKey::BigInt(n.clone())),
        Value::Str(s) => Some(InternKey::Str(s.clone())),
        Value::Symbol(s) => Some(InternKey::Symbol(*s)),
        Value::Date(d) => Some(InternKey::Date(d.timestamp_millis())),
        Value::Function(_)
        | Value::Object(_)
        | Value::Array(_)
        | Value::Map(_)
        | Value::Set(_)
        | Value::Custom(_) => value.instance_addr().map(InternKey::Instance),
    }
}

/// Encode-side reference table.
#[derive(Debug, Default)]
pub struct RefInterner {
    ids: HashMap<InternKey, u32>,
    next_id: u32,
    duplicate_hits: u64,
}

impl RefInterner {
    /// A fresh, empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id already assigned to `key`, if any. Counts the duplicate hit.
    pub fn lookup(&mut self, key: &InternKey) -> Option<u32> {
        let id = self.ids.get(key).copied();
        if id.is_some() {
            self.duplicate_hits += 1;
        }
        id
    }

    /// Assign the next id to `key`.
    pub fn declare(&mut self, key: InternKey) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        id
    }

    /// Number of declarations so far.
    pub fn declared(&self) -> usize {
        self.ids.len()
    }

    /// Number of repeat sightings so far.
    pub fn duplicate_hits(&self) -> u64 {
        self.duplicate_hits
    }

    /// Reset to the initial state. Idempotent.
    pub fn wipe(&mut self) {
        self.ids.clear();
        self.next_id = 0;
        self.duplicate_hits = 0;
    }

    /// Prune unreferenced declarations and compact the id space.
    ///
    /// Declarations with no pointer lose their `@<id>=` prefix in place;
    /// the rest are renumbered `0..k-1` in first-declaration order, along
    /// with every pointer.
    pub fn clean(&self, serialized: &str) -> String {
        let mut declared_order: Vec<u32> = Vec::new();
        let mut used: HashSet<u32> = HashSet::new();
        for caps in REF_TOKEN.captures_iter(serialized) {
            if let Some(decl) = caps.get(1) {
                if let Ok(id) = decl.as_str().parse::<u32>() {
                    declared_order.push(id);
                }
            } else if let Some(ptr) = caps.get(2) {
                if let Ok(id) = ptr.as_str().parse::<u32>() {
                    used.insert(id);
                }
            }
        }

        let mut remap: HashMap<u32, u32> = HashMap::new();
        for id in declared_order {
            if used.contains(&id) {
                let fresh = remap.len() as u32;
                remap.insert(id, fresh);
            }
        }

        REF_TOKEN
            .replace_all(serialized, |caps: &Captures<'_>| {
                if let Some(decl) = caps.get(1) {
                    let id: u32 = decl.as_str().parse().unwrap_or(u32::MAX);
                    match remap.get(&id) {
                        Some(fresh) => format!("@{fresh}="),
                        None => String::new(),
                    }
                } else {
                    let id: u32 = caps[2].parse().unwrap_or(u32::MAX);
                    match remap.get(&id) {
                        Some(fresh) => format!("#{fresh}"),
                        None => caps[0].to_string(),
                    }
                }
            })
            .into_owned()
    }
}

/// Decode-side reference table.
#[derive(Debug, Default)]
pub struct RefBindings {
    slots: HashMap<u32, Value>,
}

impl RefBindings {
    /// A fresh, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value bound to `id`; unbound ids are a decode error.
    pub fn get(&self, id: u32) -> Result<Value> {
        self.slots.get(&id).cloned().ok_or_else(|| {
            SerimeError::DecodeReference(format!("reference #{id} is not declared yet"))
        })
    }

    /// Bind `id`, silently overwriting any prior binding.
    pub fn set(&mut self, id: u32, value: Value) {
        self.slots.insert(id, value);
    }

    /// Reset to the initial state. Idempotent.
    pub fn wipe(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_zero_is_exempt() {
        assert!(intern_key(&Value::Number(0.0)).is_none());
        assert!(intern_key(&Value::Number(-0.0)).is_none());
        assert!(intern_key(&Value::Number(1.0)).is_some());
    }

    #[test]
    fn test_intern_all_nans_share_a_key() {
        let a = intern_key(&Value::Number(f64::NAN)).unwrap();
        let b = intern_key(&Value::Number(-f64::NAN)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_instances_by_pointer() {
        let obj = Value::object();
        let alias = obj.clone();
        let other = Value::object();
        assert_eq!(intern_key(&obj), intern_key(&alias));
        assert_ne!(intern_key(&obj), intern_key(&other));
    }

    #[test]
    fn test_declare_then_lookup() {
        let mut refs = RefInterner::new();
        let key = InternKey::Str("x".to_string());
        assert!(refs.lookup(&key).is_none());
        assert_eq!(refs.declare(key.clone()), 0);
        assert_eq!(refs.lookup(&key), Some(0));
        assert_eq!(refs.duplicate_hits(), 1);
        assert_eq!(refs.declare(InternKey::Bool(true)), 1);
    }

    #[test]
    fn test_clean_strips_unreferenced_declarations() {
        let refs = RefInterner::new();
        assert_eq!(refs.clean("@0=3|{}"), "3|{}");
        assert_eq!(refs.clean("3|{[@0=1|a]%7:2|1}"), "3|{[1|a]%7:2|1}");
    }

    #[test]
    fn test_clean_compacts_and_renumbers() {
        let refs = RefInterner::new();
        // declaration 0 is unused, 2 is used: 2 becomes 0
        let input = "3|{[@0=1|a]%7:@2=3|{[1|b]%7:#2}}";
        assert_eq!(refs.clean(input), "3|{[1|a]%7:@0=3|{[1|b]%7:#0}}");
    }

    #[test]
    fn test_clean_keeps_multidigit_ids_apart() {
        let refs = RefInterner::new();
        // #12 must not be mistaken for a use of declaration 1
        let input = "@1=3|{[1|a]%7:@12=1|x,[1|b]%7:#12}";
        assert_eq!(refs.clean(input), "3|{[1|a]%7:@0=1|x,[1|b]%7:#0}");
    }

    #[test]
    fn test_clean_preserves_first_declaration_order() {
        let refs = RefInterner::new();
        let input = "5|{[@3=1|k]:#3,[@1=1|m]:#1}";
        assert_eq!(refs.clean(input), "5|{[@0=1|k]:#0,[@1=1|m]:#1}");
    }

    #[test]
    fn test_bindings_get_unbound_fails() {
        let refs = RefBindings::new();
        assert!(matches!(
            refs.get(0),
            Err(SerimeError::DecodeReference(_))
        ));
    }

    #[test]
    fn test_bindings_set_overwrites_silently() {
        let mut refs = RefBindings::new();
        refs.set(0, Value::Bool(false));
        refs.set(0, Value::Bool(true));
        assert!(matches!(refs.get(0), Ok(Value::Bool(true))));
    }

    #[test]
    fn test_wipe_is_idempotent() {
        let mut interner = RefInterner::new();
        interner.declare(InternKey::Null);
        interner.wipe();
        interner.wipe();
        assert_eq!(interner.declared(), 0);
    }
}
