//! Bitflag containers for property descriptors and object accessibility
//!
//! Flags are packed into a 32-bit integer on the wire (`%<bits>`). Each
//! flag enum is validated against the container rules: members are positive
//! powers of two, fit a 32-bit signed integer, and carry no duplicates.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, SerimeError};

/// A flag enum usable inside a [`FlagSet`].
pub trait BitFlag: Copy + Eq + 'static {
    /// Human-readable label for the flag family, used in diagnostics.
    const LABEL: &'static str;

    /// The full member table, in declaration order.
    fn members() -> &'static [(Self, &'static str)];

    /// The single bit this flag occupies.
    fn bits(self) -> u32;
}

/// Per-property descriptor flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PropertyFlag {
    /// Property can be reconfigured or deleted
    Configurable = 1,
    /// Property shows up in enumeration
    Enumerable = 2,
    /// Property value can be reassigned
    Writable = 4,
    /// Property is backed by a get/set accessor pair (reserved)
    Accessor = 8,
    /// Property carries attached metadata (reserved)
    Metadata = 16,
}

impl BitFlag for PropertyFlag {
    const LABEL: &'static str = "property descriptor";

    fn members() -> &'static [(Self, &'static str)] {
        &[
            (PropertyFlag::Configurable, "configurable"),
            (PropertyFlag::Enumerable, "enumerable"),
            (PropertyFlag::Writable, "writable"),
            (PropertyFlag::Accessor, "accessor"),
            (PropertyFlag::Metadata, "metadata"),
        ]
    }

    fn bits(self) -> u32 {
        self as u32
    }
}

/// Per-object accessibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AccessFlag {
    /// Object is frozen (implies sealed at the host level)
    Frozen = 1,
    /// Object is sealed
    Sealed = 2,
    /// Object refuses new properties
    NonExtensible = 4,
    /// Object carries attached metadata (reserved)
    Metadata = 8,
}

impl BitFlag for AccessFlag {
    const LABEL: &'static str = "object accessibility";

    fn members() -> &'static [(Self, &'static str)] {
        &[
            (AccessFlag::Frozen, "frozen"),
            (AccessFlag::Sealed, "sealed"),
            (AccessFlag::NonExtensible, "non-extensible"),
            (AccessFlag::Metadata, "metadata"),
        ]
    }

    fn bits(self) -> u32 {
        self as u32
    }
}

/// Validate a flag enum's member table against the container rules.
///
/// Fatal on: empty table, zero value, value above the 32-bit signed range,
/// non-power-of-two value, duplicate bit. Emits a capacity warning when the
/// table holds seven or more members.
pub fn validate_members<F: BitFlag>() -> Result<()> {
    let members = F::members();
    if members.is_empty() {
        return Err(SerimeError::BitflagInvalid(format!(
            "{} enum has no members",
            F::LABEL
        )));
    }
    let mut seen = 0u32;
    for (flag, name) in members {
        let bits = flag.bits();
        if bits == 0 {
            return Err(SerimeError::BitflagInvalid(format!(
                "{} flag '{name}' is zero",
                F::LABEL
            )));
        }
        if bits >= 1 << 31 {
            return Err(SerimeError::BitflagInvalid(format!(
                "{} flag '{name}' exceeds the 32-bit signed range",
                F::LABEL
            )));
        }
        if !bits.is_power_of_two() {
            return Err(SerimeError::BitflagInvalid(format!(
                "{} flag '{name}' is not a power of two",
                F::LABEL
            )));
        }
        if seen & bits != 0 {
            return Err(SerimeError::BitflagInvalid(format!(
                "{} flag '{name}' duplicates bit {bits}",
                F::LABEL
            )));
        }
        seen |= bits;
    }
    if members.len() >= 7 {
        tracing::warn!(
            label = F::LABEL,
            count = members.len(),
            "flag enum is close to the 31-bit capacity"
        );
    }
    Ok(())
}

/// A packed set of flags drawn from one flag enum.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FlagSet<F: BitFlag> {
    bits: u32,
    _family: PhantomData<F>,
}

impl<F: BitFlag> Default for FlagSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: BitFlag> FlagSet<F> {
    /// The empty set.
    pub fn new() -> Self {
        Self {
            bits: 0,
            _family: PhantomData,
        }
    }

    /// Construct from named members.
    pub fn from_flags(flags: &[F]) -> Self {
        let mut set = Self::new();
        set.enable(flags);
        set
    }

    /// Construct from a raw integer, rejecting bits outside the member
    /// table.
    pub fn from_bits(bits: u32) -> Result<Self> {
        let known = F::members().iter().fold(0u32, |acc, (f, _)| acc | f.bits());
        if bits & !known != 0 {
            return Err(SerimeError::BitflagInvalid(format!(
                "{} value {bits} carries unknown bits",
                F::LABEL
            )));
        }
        Ok(Self {
            bits,
            _family: PhantomData,
        })
    }

    /// True when every given flag is set.
    pub fn has(&self, flags: &[F]) -> bool {
        let mask = flags.iter().fold(0u32, |acc, f| acc | f.bits());
        self.bits & mask == mask
    }

    /// Set the given flags.
    pub fn enable(&mut self, flags: &[F]) -> &mut Self {
        for f in flags {
            self.bits |= f.bits();
        }
        self
    }

    /// Clear the given flags.
    pub fn disable(&mut self, flags: &[F]) -> &mut Self {
        for f in flags {
            self.bits &= !f.bits();
        }
        self
    }

    /// Flip the given flags.
    pub fn toggle(&mut self, flags: &[F]) -> &mut Self {
        for f in flags {
            self.bits ^= f.bits();
        }
        self
    }

    /// Integer view.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// True when no flag is set.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl<F: BitFlag> fmt::Debug for FlagSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (flag, name) in F::members() {
            map.entry(name, &(self.bits & flag.bits() != 0));
        }
        map.finish()
    }
}

/// Descriptor of a plain data property: configurable, enumerable, writable.
pub fn default_property_flags() -> FlagSet<PropertyFlag> {
    FlagSet::from_flags(&[
        PropertyFlag::Configurable,
        PropertyFlag::Enumerable,
        PropertyFlag::Writable,
    ])
}
