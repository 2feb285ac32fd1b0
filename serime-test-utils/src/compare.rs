//! Cycle-safe structural comparison
//!
//! Deep equality over value graphs with a navigation trail for
//! diagnostics. The seen-pair set is scoped to one comparison call, and a
//! mismatch always reports `false`.

use std::collections::HashSet;

use serime_format::{PropKey, Value};

/// One comparison run. Holds the seen-pair set and the navigation trail of
/// the first mismatch.
pub struct Comparison {
    seen: HashSet<(usize, usize)>,
    trail: Vec<String>,
}

impl Comparison {
    /// A fresh run.
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            trail: vec!["root".to_string()],
        }
    }

    /// Navigation trail of the first mismatch, for diagnostics.
    pub fn trail(&self) -> &[String] {
        &self.trail
    }

    /// Deep structural equality of two value graphs.
    pub fn check(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y || self.mismatch("boolean"),
            // identity semantics: every NaN equals NaN, +0 and -0 differ
            (Value::Number(x), Value::Number(y)) => {
                (x.is_nan() && y.is_nan()) || x.to_bits() == y.to_bits() || self.mismatch("number")
            }
            (Value::BigInt(x), Value::BigInt(y)) => x == y || self.mismatch("bigint"),
            (Value::Str(x), Value::Str(y)) => x == y || self.mismatch("string"),
            (Value::Symbol(x), Value::Symbol(y)) => x == y || self.mismatch("symbol"),
            (Value::Date(x), Value::Date(y)) => {
                x.timestamp_millis() == y.timestamp_millis() || self.mismatch("date")
            }
            (Value::Function(x), Value::Function(y)) => {
                (x.name == y.name && x.source == y.source) || self.mismatch("function")
            }
            (Value::Object(_), Value::Object(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Map(_), Value::Map(_))
            | (Value::Set(_), Value::Set(_))
            | (Value::Custom(_), Value::Custom(_)) => self.check_entried(a, b),
            _ => self.mismatch("type"),
        }
    }

    fn check_entried(&mut self, a: &Value, b: &Value) -> bool {
        let pair = (
            a.instance_addr().unwrap_or_default(),
            b.instance_addr().unwrap_or_default(),
        );
        // a revisited pair is already being compared higher up the stack
        if !self.seen.insert(pair) {
            return true;
        }

        let access_a = a.accessibility().map(|f| f.bits()).unwrap_or(0);
        let access_b = b.accessibility().map(|f| f.bits()).unwrap_or(0);
        if access_a != access_b {
            return self.mismatch("accessibility");
        }

        match (a, b) {
            (Value::Object(x), Value::Object(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                self.check_properties(&x.entries, &y.entries)
            }
            (Value::Custom(x), Value::Custom(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                if x.class != y.class {
                    return self.mismatch("class");
                }
                self.check_properties(&x.entries, &y.entries)
            }
            (Value::Array(x), Value::Array(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                if x.items.len() != y.items.len() {
                    return self.mismatch("length");
                }
                for (i, (px, py)) in x.items.iter().zip(y.items.iter()).enumerate() {
                    if px.flags.bits() != py.flags.bits() {
                        self.trail.push(format!("descriptor [{i}]"));
                        return false;
                    }
                    self.trail.push(format!("[{i}]"));
                    if !self.check(&px.value, &py.value) {
                        return false;
                    }
                    self.trail.pop();
                }
                true
            }
            (Value::Map(x), Value::Map(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                if x.entries.len() != y.entries.len() {
                    return self.mismatch("size");
                }
                for (i, ((kx, vx), (ky, vy))) in
                    x.entries.iter().zip(y.entries.iter()).enumerate()
                {
                    self.trail.push(format!("key #{i}"));
                    if !self.check(kx, ky) {
                        return false;
                    }
                    self.trail.pop();
                    self.trail.push(format!("value #{i}"));
                    if !self.check(vx, vy) {
                        return false;
                    }
                    self.trail.pop();
                }
                true
            }
            (Value::Set(x), Value::Set(y)) => {
                let (x, y) = (x.borrow(), y.borrow());
                if x.members.len() != y.members.len() {
                    return self.mismatch("size");
                }
                for (i, (mx, my)) in x.members.iter().zip(y.members.iter()).enumerate() {
                    self.trail.push(format!("member #{i}"));
                    if !self.check(mx, my) {
                        return false;
                    }
                    self.trail.pop();
                }
                true
            }
            _ => self.mismatch("type"),
        }
    }

    fn check_properties(
        &mut self,
        a: &indexmap::IndexMap<PropKey, serime_format::Property>,
        b: &indexmap::IndexMap<PropKey, serime_format::Property>,
    ) -> bool {
        if a.len() != b.len() {
            return self.mismatch("own-key count");
        }
        for (key, pa) in a {
            let label = match key {
                PropKey::Str(s) => s.clone(),
                PropKey::Symbol(sym) => format!("@@{}", sym.name()),
            };
            let Some(pb) = b.get(key) else {
                self.trail.push(format!("key '{label}'"));
                return false;
            };
            if pa.flags.bits() != pb.flags.bits() {
                self.trail.push(format!("descriptor '{label}'"));
                return false;
            }
            self.trail.push(format!("'{label}'"));
            if !self.check(&pa.value, &pb.value) {
                return false;
            }
            self.trail.pop();
        }
        true
    }

    // records the failing step and always reports inequality
    fn mismatch(&mut self, what: &str) -> bool {
        self.trail.push(format!("≠ {what}"));
        false
    }
}

impl Default for Comparison {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep structural equality with a fresh comparison scope.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
    Comparison::new().check(a, b)
}
