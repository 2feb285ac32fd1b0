//! The well-known named symbol table
//!
//! Only well-known symbols travel through the format; they are serialized
//! as an index into this fixed, ordered table.

use crate::error::{Result, SerimeError};

/// Well-known named symbols, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum WellKnownSymbol {
    AsyncIterator = 0,
    HasInstance = 1,
    IsConcatSpreadable = 2,
    Iterator = 3,
    Match = 4,
    MatchAll = 5,
    Replace = 6,
    Search = 7,
    Species = 8,
    Split = 9,
    ToPrimitive = 10,
    ToStringTag = 11,
    Unscopables = 12,
}

/// The full table, in index order.
pub const WELL_KNOWN_SYMBOLS: [WellKnownSymbol; 13] = [
    WellKnownSymbol::AsyncIterator,
    WellKnownSymbol::HasInstance,
    WellKnownSymbol::IsConcatSpreadable,
    WellKnownSymbol::Iterator,
    WellKnownSymbol::Match,
    WellKnownSymbol::MatchAll,
    WellKnownSymbol::Replace,
    WellKnownSymbol::Search,
    WellKnownSymbol::Species,
    WellKnownSymbol::Split,
    WellKnownSymbol::ToPrimitive,
    WellKnownSymbol::ToStringTag,
    WellKnownSymbol::Unscopables,
];

impl WellKnownSymbol {
    /// Position in the well-known table.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Resolve a table index back to a symbol.
    pub fn from_index(index: u32) -> Result<Self> {
        WELL_KNOWN_SYMBOLS
            .get(index as usize)
            .copied()
            .ok_or_else(|| {
                SerimeError::DecodeTypeUnknown(format!("symbol index {index} is out of table"))
            })
    }

    /// The symbol's description text.
    pub fn name(self) -> &'static str {
        match self {
            WellKnownSymbol::AsyncIterator => "asyncIterator",
            WellKnownSymbol::HasInstance => "hasInstance",
            WellKnownSymbol::IsConcatSpreadable => "isConcatSpreadable",
            WellKnownSymbol::Iterator => "iterator",
            WellKnownSymbol::Match => "match",
            WellKnownSymbol::MatchAll => "matchAll",
            WellKnownSymbol::Replace => "replace",
            WellKnownSymbol::Search => "search",
            WellKnownSymbol::Species => "species",
            WellKnownSymbol::Split => "split",
            WellKnownSymbol::ToPrimitive => "toPrimitive",
            WellKnownSymbol::ToStringTag => "toStringTag",
            WellKnownSymbol::Unscopables => "unscopables",
        }
    }
}
