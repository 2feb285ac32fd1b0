//! Encoder
//!
//! Walks the value graph, interning every interning-eligible value so
//! repeat sightings become `#<id>` pointers, dispatching per type for the
//! payload, and finishing with the reference compaction pass and the
//! optional dependency prelude.

use std::time::Instant;

use serime_format::constants::{
    BOOL_FALSE, BOOL_TRUE, NATIVE_SOURCE_MARK, NUMBER_INF, NUMBER_NAN, NUMBER_NEG_INF,
};
use serime_format::escape::escape;
use serime_format::value::Property;
use serime_format::{PropKey, PropertyFlag, Result, SerimeError, TypeTag, Value};

use crate::refs::{intern_key, RefInterner};
use crate::registry::DependencyTable;
use crate::Options;

/// The encode engine. Owns its reference and dependency tables for the
/// duration of one [`Encoder::serialize`] call; not reentrant.
#[derive(Debug)]
pub struct Encoder {
    options: Options,
    refs: RefInterner,
    deps: DependencyTable,
    sub_serializations: u64,
}

impl Encoder {
    /// A fresh engine with the given options (value-copied, frozen).
    pub fn new(options: Options) -> Self {
        Self {
            options,
            refs: RefInterner::new(),
            deps: DependencyTable::new(),
            sub_serializations: 0,
        }
    }

    /// Reset all internal state. Idempotent; invoked at the start of each
    /// [`Encoder::serialize`].
    pub fn wipe(&mut self) {
        self.refs.wipe();
        self.deps.wipe();
        self.sub_serializations = 0;
    }

    /// Encode a value graph to its Serime text form.
    pub fn serialize(&mut self, value: &Value) -> Result<String> {
        self.wipe();
        if self.options.metadata {
            return Err(SerimeError::EncodeTypeUnsupported(
                "metadata support is reserved".to_string(),
            ));
        }
        let started = Instant::now();

        let body = self.serialize_value(value)?;
        let cleaned = self.refs.clean(&body);
        let output = if self.deps.is_empty() {
            cleaned
        } else {
            format!("{}{}", self.deps.render_prelude(), cleaned)
        };

        if self.options.debug_mode {
            tracing::debug!(
                sub_serializations = self.sub_serializations,
                duplicate_references = self.refs.duplicate_hits(),
                declared_references = self.refs.declared(),
                injected_classes = self.deps.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "serialize finished"
            );
        }
        Ok(output)
    }

    /// Serialize one value, wrapping the payload in reference bookkeeping
    /// and the accessibility prefix.
    fn serialize_value(&mut self, value: &Value) -> Result<String> {
        self.sub_serializations += 1;

        let prefix = match value.accessibility() {
            Some(access) if !access.is_empty() => format!("%{}:", access.bits()),
            _ => String::new(),
        };

        match intern_key(value) {
            Some(key) => {
                if let Some(id) = self.refs.lookup(&key) {
                    return Ok(format!("{prefix}#{id}"));
                }
                // Declared before children recurse so cycles collapse
                // into pointers.
                let id = self.refs.declare(key);
                let payload = self.serialize_plain(value)?;
                Ok(format!("{prefix}@{id}={payload}"))
            }
            None => Ok(format!("{prefix}{}", self.serialize_plain(value)?)),
        }
    }

    fn serialize_plain(&mut self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok(TypeTag::Null.render()),
            Value::Undefined => Ok(TypeTag::Undefined.render()),
            Value::Bool(b) => Ok(format!("8|{}", if *b { BOOL_TRUE } else { BOOL_FALSE })),
            Value::Number(n) => Ok(format!("2|{}", render_number(*n))),
            Value::BigInt(n) => Ok(format!("11|{n}")),
            Value::Str(s) => Ok(format!("1|{}", escape(s))),
            Value::Symbol(sym) => Ok(format!("7|{}", sym.index())),
            Value::Date(d) => {
                let canonical = d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
                Ok(format!("12|{}", escape(&canonical)))
            }
            Value::Function(func) => {
                if !self.options.functions {
                    return Err(SerimeError::EncodeTypeUnsupported(
                        "function encoding is disabled".to_string(),
                    ));
                }
                if func.source.contains(NATIVE_SOURCE_MARK) {
                    return Err(SerimeError::EncodeTypeUnsupported(format!(
                        "function '{}' has native source",
                        func.name
                    )));
                }
                Ok(format!(
                    "9|{}~{}",
                    escape(&func.name),
                    escape(&func.source)
                ))
            }
            Value::Object(slot) => {
                let slot = slot.borrow();
                let entries = self.serialize_properties(slot.entries.iter())?;
                Ok(format!("3|{{{entries}}}"))
            }
            Value::Array(slot) => {
                let slot = slot.borrow();
                let mut parts = Vec::with_capacity(slot.items.len());
                for (index, prop) in slot.items.iter().enumerate() {
                    let key = PropKey::Str(index.to_string());
                    parts.push(self.serialize_entry(&key, prop)?);
                }
                Ok(format!("4|{{{}}}", parts.join(",")))
            }
            Value::Map(slot) => {
                let slot = slot.borrow();
                let mut parts = Vec::with_capacity(slot.entries.len());
                for (key, val) in &slot.entries {
                    let key_block = self.serialize_value(key)?;
                    let value_block = self.serialize_value(val)?;
                    parts.push(format!("[{key_block}]:{value_block}"));
                }
                Ok(format!("5|{{{}}}", parts.join(",")))
            }
            Value::Set(slot) => {
                let slot = slot.borrow();
                let mut parts = Vec::with_capacity(slot.members.len());
                for member in &slot.members {
                    parts.push(self.serialize_value(member)?);
                }
                Ok(format!("6|{{{}}}", parts.join(",")))
            }
            Value::Custom(slot) => {
                let class = slot.borrow().class.clone();
                let index = self.deps.intern(&class);
                let slot = slot.borrow();
                let entries = self.serialize_properties(slot.entries.iter())?;
                Ok(format!("${index}|{{{entries}}}"))
            }
        }
    }

    fn serialize_properties<'a>(
        &mut self,
        entries: impl Iterator<Item = (&'a PropKey, &'a Property)>,
    ) -> Result<String> {
        let mut parts = Vec::new();
        for (key, prop) in entries {
            parts.push(self.serialize_entry(key, prop)?);
        }
        Ok(parts.join(","))
    }

    fn serialize_entry(&mut self, key: &PropKey, prop: &Property) -> Result<String> {
        if prop.flags.has(&[PropertyFlag::Accessor]) {
            return Err(SerimeError::EncodeTypeUnsupported(
                "accessor properties are reserved".to_string(),
            ));
        }
        if prop.flags.has(&[PropertyFlag::Metadata]) {
            return Err(SerimeError::EncodeTypeUnsupported(
                "property metadata is reserved".to_string(),
            ));
        }
        let key_block = match key {
            PropKey::Str(s) => self.serialize_value(&Value::Str(s.clone()))?,
            PropKey::Symbol(sym) => self.serialize_value(&Value::Symbol(*sym))?,
        };
        let value_block = self.serialize_value(&prop.value)?;
        Ok(format!(
            "[{key_block}]%{}:{}",
            prop.flags.bits(),
            value_block
        ))
    }
}

fn render_number(n: f64) -> String {
    if n.is_nan() {
        NUMBER_NAN.to_string()
    } else if n == f64::INFINITY {
        NUMBER_INF.to_string()
    } else if n == f64::NEG_INFINITY {
        NUMBER_NEG_INF.to_string()
    } else {
        // shortest decimal form; the sign of zero survives
        format!("{n}")
    }
}
