//! Custom-class dependency table and registry
//!
//! The format carries class *names* only. The encoder collects the names
//! it meets into an ordered dependency table (`$N` indexes it, prelude
//! `![name,…]!` carries it). The decoder resolves each name against a
//! caller-supplied registry of holder factories; a factory produces an
//! uninitialized instance — the user constructor is never invoked.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serime_format::escape::escape;
use serime_format::value::CustomSlot;
use serime_format::CustomRef;

/// Encode-side ordered table of custom class names, indexed by first use.
#[derive(Debug, Default)]
pub struct DependencyTable {
    names: Vec<String>,
}

impl DependencyTable {
    /// A fresh, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The index for `name`, appending it on first sighting.
    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            return pos as u32;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as u32
    }

    /// True when no custom class was seen.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of interned classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// The dependency prelude, `![name1,name2,…]!`, names escaped.
    pub fn render_prelude(&self) -> String {
        let names: Vec<String> = self.names.iter().map(|n| escape(n)).collect();
        format!("![{}]!", names.join(","))
    }

    /// Reset to the initial state. Idempotent.
    pub fn wipe(&mut self) {
        self.names.clear();
    }
}

type Factory = Box<dyn Fn() -> CustomRef>;

/// Decode-side registry mapping class names to holder factories.
#[derive(Default)]
pub struct ClassRegistry {
    factories: IndexMap<String, Factory>,
}

impl ClassRegistry {
    /// A fresh, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class with the default factory (an empty instance of
    /// that class).
    pub fn register(&mut self, name: &str) -> &mut Self {
        let class = name.to_string();
        self.factories.insert(
            name.to_string(),
            Box::new(move || Rc::new(RefCell::new(CustomSlot::uninitialized(&class)))),
        );
        self
    }

    /// Register a class with a caller-supplied holder factory.
    pub fn register_factory<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> CustomRef + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
        self
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Produce an uninitialized holder for `name`.
    pub fn create(&self, name: &str) -> Option<CustomRef> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
