//! Decoder
//!
//! Parses a Serime text back into a value graph. Holders for entried and
//! custom values are allocated and bound to their reference id before any
//! child is decoded, so cyclic pointers resolve to the holder under
//! construction.

use std::time::Instant;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serime_format::constants::{
    BOOL_FALSE, BOOL_TRUE, DEPS_CLOSE, DEPS_OPEN, NUMBER_INF, NUMBER_NAN, NUMBER_NEG_INF,
};
use serime_format::escape::unescape;
use serime_format::value::Property;
use serime_format::{
    FlagSet, PropKey, PropertyFlag, Result, SerimeError, TypeTag, Value, WellKnownSymbol,
};

use crate::block::{split_key, BlockInfo, RefMark};
use crate::entry::{split_items, split_pairs};
use crate::refs::RefBindings;
use crate::registry::ClassRegistry;
use crate::Options;

/// The decode engine. Owns its reference bindings and resolved dependency
/// table for the duration of one [`Decoder::deserialize`] call; not
/// reentrant.
#[derive(Debug)]
pub struct Decoder<'r> {
    options: Options,
    registry: &'r ClassRegistry,
    bindings: RefBindings,
    classes: Vec<String>,
    decoded_blocks: u64,
}

impl<'r> Decoder<'r> {
    /// A fresh engine with the given options (value-copied, frozen) and
    /// the caller's class registry.
    pub fn new(options: Options, registry: &'r ClassRegistry) -> Self {
        Self {
            options,
            registry,
            bindings: RefBindings::new(),
            classes: Vec::new(),
            decoded_blocks: 0,
        }
    }

    /// Reset all internal state. Idempotent; invoked at the start of each
    /// [`Decoder::deserialize`].
    pub fn wipe(&mut self) {
        self.bindings.wipe();
        self.classes.clear();
        self.decoded_blocks = 0;
    }

    /// Decode a Serime text back into a value graph.
    pub fn deserialize(&mut self, input: &str) -> Result<Value> {
        self.wipe();
        let started = Instant::now();

        let body = self.parse_prelude(input)?;
        let value = self.decode_block(body)?;

        if self.options.debug_mode {
            tracing::debug!(
                decoded_blocks = self.decoded_blocks,
                injected_classes = self.classes.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "deserialize finished"
            );
        }
        Ok(value)
    }

    /// Strip and resolve the dependency prelude, if present.
    fn parse_prelude<'a>(&mut self, input: &'a str) -> Result<&'a str> {
        let Some(after) = input.strip_prefix(DEPS_OPEN) else {
            return Ok(input);
        };
        let close = after.find(DEPS_CLOSE).ok_or_else(|| {
            SerimeError::DecodeGrammar("dependency prelude never closes".to_string())
        })?;
        for raw in after[..close].split(',') {
            let name = unescape(raw);
            if name.is_empty() {
                return Err(SerimeError::DecodeGrammar(
                    "empty dependency name".to_string(),
                ));
            }
            if self.classes.contains(&name) {
                return Err(SerimeError::DecodeReference(format!(
                    "duplicate dependency name '{name}'"
                )));
            }
            if !self.registry.contains(&name) {
                return Err(SerimeError::DecodeReference(format!(
                    "dependency '{name}' was not supplied"
                )));
            }
            self.classes.push(name);
        }
        Ok(&after[close + DEPS_CLOSE.len()..])
    }

    fn decode_block(&mut self, block: &str) -> Result<Value> {
        self.decoded_blocks += 1;
        let info = BlockInfo::parse(block)?;

        if let Some(RefMark::Get(id)) = info.reference {
            return self.bindings.get(id);
        }
        let tag = info.tag.ok_or_else(|| {
            SerimeError::DecodeGrammar(format!("block '{block}' has no type tag"))
        })?;
        if let Some(singleton) = tag.singleton_value() {
            return Ok(singleton);
        }
        let payload = info.payload.ok_or_else(|| {
            SerimeError::DecodeGrammar(format!("block '{block}' has no payload"))
        })?;

        if tag.is_entried() {
            let holder = self.allocate_holder(&tag)?;
            // Bound before children recurse so cycles close on the holder.
            if let Some(RefMark::Set(id)) = info.reference {
                self.bindings.set(id, holder.clone());
            }
            let body = payload
                .strip_prefix('{')
                .and_then(|p| p.strip_suffix('}'))
                .ok_or_else(|| {
                    SerimeError::DecodeGrammar(format!(
                        "entried payload '{payload}' is not brace-wrapped"
                    ))
                })?;
            self.fill_entries(&tag, &holder, body)?;
            if let Some(bits) = info.accessibility {
                holder.set_accessibility(FlagSet::from_bits(bits)?);
            }
            Ok(holder)
        } else {
            if info.accessibility.is_some() {
                return Err(SerimeError::DecodeGrammar(format!(
                    "accessibility prefix on non-entried block '{block}'"
                )));
            }
            let value = self.decode_scalar(&tag, &payload)?;
            if let Some(RefMark::Set(id)) = info.reference {
                self.bindings.set(id, value.clone());
            }
            Ok(value)
        }
    }

    fn allocate_holder(&mut self, tag: &TypeTag) -> Result<Value> {
        match tag {
            TypeTag::Object => Ok(Value::object()),
            TypeTag::Array => Ok(Value::array()),
            TypeTag::Map => Ok(Value::map()),
            TypeTag::Set => Ok(Value::set()),
            TypeTag::Custom(index) => {
                let class = self.classes.get(*index as usize).ok_or_else(|| {
                    SerimeError::DecodeTypeUnknown(format!(
                        "custom tag ${index} has no dependency registered"
                    ))
                })?;
                let holder = self.registry.create(class).ok_or_else(|| {
                    SerimeError::DecodeTypeUnknown(format!(
                        "no factory for dependency '{class}'"
                    ))
                })?;
                Ok(Value::Custom(holder))
            }
            other => Err(SerimeError::DecodeGrammar(format!(
                "tag {other:?} is not entried"
            ))),
        }
    }

    fn fill_entries(&mut self, tag: &TypeTag, holder: &Value, body: &str) -> Result<()> {
        match (tag, holder) {
            (TypeTag::Set, Value::Set(slot)) => {
                for item in split_items(body)? {
                    let member = self.decode_block(&item)?;
                    slot.borrow_mut().members.push(member);
                }
                Ok(())
            }
            (TypeTag::Map, Value::Map(slot)) => {
                for (key_frag, value_frag) in split_pairs(body)? {
                    let (inner, _descriptor) = split_key(&key_frag)?;
                    let key = self.decode_block(inner)?;
                    let value = self.decode_block(&value_frag)?;
                    slot.borrow_mut().entries.push((key, value));
                }
                Ok(())
            }
            (TypeTag::Object, Value::Object(_))
            | (TypeTag::Array, Value::Array(_))
            | (TypeTag::Custom(_), Value::Custom(_)) => {
                for (key_frag, value_frag) in split_pairs(body)? {
                    let (inner, descriptor) = split_key(&key_frag)?;
                    let bits = descriptor.ok_or_else(|| {
                        SerimeError::DecodeGrammar(format!(
                            "entry key '{key_frag}' has no descriptor flag"
                        ))
                    })?;
                    let flags = FlagSet::<PropertyFlag>::from_bits(bits)?;
                    if flags.has(&[PropertyFlag::Accessor]) {
                        return Err(SerimeError::DecodePolicy(
                            "accessor properties are reserved".to_string(),
                        ));
                    }
                    if flags.has(&[PropertyFlag::Metadata]) {
                        return Err(SerimeError::DecodePolicy(
                            "property metadata is reserved".to_string(),
                        ));
                    }
                    let key = self.decode_block(inner)?;
                    let value = self.decode_block(&value_frag)?;
                    let prop = Property::with_flags(value, flags);
                    self.install_property(holder, key, prop)?;
                }
                Ok(())
            }
            _ => Err(SerimeError::DecodeGrammar(
                "holder does not match its tag".to_string(),
            )),
        }
    }

    fn install_property(&mut self, holder: &Value, key: Value, prop: Property) -> Result<()> {
        match holder {
            Value::Object(slot) => {
                let key = prop_key(key)?;
                slot.borrow_mut().insert(key, prop);
                Ok(())
            }
            Value::Custom(slot) => {
                let key = prop_key(key)?;
                slot.borrow_mut().insert(key, prop);
                Ok(())
            }
            Value::Array(slot) => {
                let Value::Str(text) = key else {
                    return Err(SerimeError::DecodeGrammar(
                        "array index key is not a string".to_string(),
                    ));
                };
                let index: usize = text.parse().map_err(|_| {
                    SerimeError::DecodeGrammar(format!("array index '{text}' is not numeric"))
                })?;
                slot.borrow_mut().set_index(index, prop);
                Ok(())
            }
            _ => Err(SerimeError::DecodeGrammar(
                "holder does not take properties".to_string(),
            )),
        }
    }

    fn decode_scalar(&mut self, tag: &TypeTag, payload: &str) -> Result<Value> {
        match tag {
            TypeTag::Str => Ok(Value::Str(unescape(payload))),
            TypeTag::Bool => match payload {
                BOOL_TRUE => Ok(Value::Bool(true)),
                BOOL_FALSE => Ok(Value::Bool(false)),
                other => Err(SerimeError::DecodeGrammar(format!(
                    "boolean payload '{other}'"
                ))),
            },
            TypeTag::Number => match payload {
                NUMBER_NAN => Ok(Value::Number(f64::NAN)),
                NUMBER_INF => Ok(Value::Number(f64::INFINITY)),
                NUMBER_NEG_INF => Ok(Value::Number(f64::NEG_INFINITY)),
                other => other.parse::<f64>().map(Value::Number).map_err(|_| {
                    SerimeError::DecodeGrammar(format!("number payload '{other}'"))
                }),
            },
            TypeTag::BigInt => payload.parse::<BigInt>().map(Value::BigInt).map_err(|_| {
                SerimeError::DecodeGrammar(format!("big integer payload '{payload}'"))
            }),
            TypeTag::Symbol => {
                let index: u32 = payload.parse().map_err(|_| {
                    SerimeError::DecodeGrammar(format!("symbol payload '{payload}'"))
                })?;
                Ok(Value::Symbol(WellKnownSymbol::from_index(index)?))
            }
            TypeTag::Date => {
                let text = unescape(payload);
                DateTime::parse_from_rfc3339(&text)
                    .map(|d| Value::Date(d.with_timezone(&Utc)))
                    .map_err(|_| {
                        SerimeError::DecodeGrammar(format!("date payload '{text}'"))
                    })
            }
            TypeTag::Function => {
                if !self.options.functions {
                    return Err(SerimeError::DecodePolicy(
                        "function decoding is disabled".to_string(),
                    ));
                }
                let sep = payload.find('~').ok_or_else(|| {
                    SerimeError::DecodeGrammar("function payload has no separator".to_string())
                })?;
                Ok(Value::function(
                    unescape(&payload[..sep]),
                    unescape(&payload[sep + 1..]),
                ))
            }
            other => Err(SerimeError::DecodeGrammar(format!(
                "tag {other:?} is not scalar"
            ))),
        }
    }
}

fn prop_key(key: Value) -> Result<PropKey> {
    match key {
        Value::Str(s) => Ok(PropKey::Str(s)),
        Value::Symbol(sym) => Ok(PropKey::Symbol(sym)),
        other => Err(SerimeError::DecodeGrammar(format!(
            "property key is a {}, not a string or well-known symbol",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> Result<Value> {
        let registry = ClassRegistry::new();
        Decoder::new(Options::default(), &registry).deserialize(input)
    }

    #[test]
    fn test_singletons() {
        assert!(matches!(decode("0").unwrap(), Value::Null));
        assert!(matches!(decode("10").unwrap(), Value::Undefined));
    }

    #[test]
    fn test_scalars() {
        assert!(matches!(decode("8|T").unwrap(), Value::Bool(true)));
        assert!(matches!(decode("1|a&44;b").unwrap(), Value::Str(s) if s == "a,b"));
        match decode("2|-0").unwrap() {
            Value::Number(n) => assert_eq!(n.to_bits(), (-0.0f64).to_bits()),
            other => panic!("expected number, got {other:?}"),
        }
        match decode("2|NaN").unwrap() {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_object_with_descriptor() {
        let value = decode("3|{[1|a]%7:2|1}").unwrap();
        let Value::Object(slot) = value else {
            panic!("expected object")
        };
        let slot = slot.borrow();
        let prop = slot.get(&PropKey::from("a")).unwrap();
        assert_eq!(prop.flags.bits(), 7);
        assert!(matches!(prop.value, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn test_object_entry_without_descriptor_is_rejected() {
        assert!(matches!(
            decode("3|{[1|a]:2|1}"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }

    #[test]
    fn test_self_cycle_resolves() {
        let value = decode("@0=3|{[1|self]%7:#0}").unwrap();
        let Value::Object(slot) = &value else {
            panic!("expected object")
        };
        let inner = slot.borrow().get(&PropKey::from("self")).unwrap().value.clone();
        assert!(value.same_instance(&inner));
    }

    #[test]
    fn test_unbound_reference_is_rejected() {
        assert!(matches!(
            decode("#0"),
            Err(SerimeError::DecodeReference(_))
        ));
        assert!(matches!(
            decode("3|{[1|a]%7:#5}"),
            Err(SerimeError::DecodeReference(_))
        ));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert!(matches!(
            decode("13|x"),
            Err(SerimeError::DecodeTypeUnknown(_))
        ));
    }

    #[test]
    fn test_custom_without_prelude_is_rejected() {
        assert!(matches!(
            decode("$0|{}"),
            Err(SerimeError::DecodeTypeUnknown(_))
        ));
    }

    #[test]
    fn test_prelude_duplicate_names_rejected() {
        let mut registry = ClassRegistry::new();
        registry.register("Widget");
        let err = Decoder::new(Options::default(), &registry)
            .deserialize("![Widget,Widget]!$0|{}")
            .unwrap_err();
        assert!(matches!(err, SerimeError::DecodeReference(_)));
    }

    #[test]
    fn test_prelude_missing_dependency_rejected() {
        let registry = ClassRegistry::new();
        let err = Decoder::new(Options::default(), &registry)
            .deserialize("![Widget]!$0|{}")
            .unwrap_err();
        assert!(matches!(err, SerimeError::DecodeReference(_)));
    }

    #[test]
    fn test_custom_instance_decodes_through_registry() {
        let mut registry = ClassRegistry::new();
        registry.register("Widget");
        let value = Decoder::new(Options::default(), &registry)
            .deserialize("![Widget]!$0|{[1|size]%7:2|3}")
            .unwrap();
        let Value::Custom(slot) = value else {
            panic!("expected custom instance")
        };
        assert_eq!(slot.borrow().class, "Widget");
        assert!(slot.borrow().entries.contains_key(&PropKey::from("size")));
    }

    #[test]
    fn test_function_policy() {
        let input = "9|f~function f() &123; &125;";
        assert!(matches!(decode(input), Err(SerimeError::DecodePolicy(_))));

        let registry = ClassRegistry::new();
        let opts = Options {
            functions: true,
            ..Options::default()
        };
        let value = Decoder::new(opts, &registry).deserialize(input).unwrap();
        let Value::Function(func) = value else {
            panic!("expected function")
        };
        assert_eq!(func.name, "f");
        assert_eq!(func.source, "function f() { }");
    }

    #[test]
    fn test_accessor_bits_rejected() {
        // descriptor 15 carries the accessor bit (8)
        assert!(matches!(
            decode("3|{[1|a]%15:2|1}"),
            Err(SerimeError::DecodePolicy(_))
        ));
    }

    #[test]
    fn test_accessibility_applied_to_holder() {
        let value = decode("%1:3|{}").unwrap();
        assert!(value.is_frozen());
        assert!(!value.is_extensible());
    }

    #[test]
    fn test_array_index_gap_fills_with_undefined() {
        let value = decode("4|{[1|2]%7:8|T}").unwrap();
        let Value::Array(slot) = value else {
            panic!("expected array")
        };
        let slot = slot.borrow();
        assert_eq!(slot.items.len(), 3);
        assert!(matches!(slot.items[0].value, Value::Undefined));
        assert!(matches!(slot.items[2].value, Value::Bool(true)));
    }

    #[test]
    fn test_map_keys_are_arbitrary_values() {
        let value = decode("5|{[2|1]:1|one,[8|T]:1|yes}").unwrap();
        let Value::Map(slot) = value else {
            panic!("expected map")
        };
        let slot = slot.borrow();
        assert_eq!(slot.entries.len(), 2);
        assert!(matches!(slot.entries[0].0, Value::Number(n) if n == 1.0));
        assert!(matches!(&slot.entries[1].1, Value::Str(s) if s == "yes"));
    }

    #[test]
    fn test_set_members() {
        let value = decode("6|{2|1,2|2,1|three}").unwrap();
        let Value::Set(slot) = value else {
            panic!("expected set")
        };
        assert_eq!(slot.borrow().members.len(), 3);
    }

    #[test]
    fn test_empty_entried_bodies() {
        assert!(matches!(decode("3|{}").unwrap(), Value::Object(_)));
        assert!(matches!(decode("6|{}").unwrap(), Value::Set(_)));
    }

    #[test]
    fn test_unclosed_prelude_rejected() {
        assert!(matches!(
            decode("![Widget"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }
}
