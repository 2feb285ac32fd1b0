//! Serime Codec - Encoder/decoder engines
//!
//! This crate provides the core engines for the Serime format:
//!
//! - Reference management: interning, declaration compaction, decode-time
//!   bindings
//! - The entry tokenizer for brace-nested bodies
//! - The serialized-block extractor
//! - The custom-class registry and dependency table
//! - The encoder and decoder

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod decode;
pub mod encode;
pub mod entry;
pub mod refs;
pub mod registry;

// Re-export commonly used types
pub use serime_format::{Result, SerimeError, TypeTag, Value};

pub use block::{BlockInfo, RefMark};
pub use decode::Decoder;
pub use encode::Encoder;
pub use registry::{ClassRegistry, DependencyTable};

/// Engine configuration.
///
/// Options are value-copied into the engine at construction and never
/// change afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Emit timing and reference statistics for each top-level call.
    pub debug_mode: bool,
    /// Permit encode and decode of function source text. Decoded functions
    /// are reconstructed as data; their source is never evaluated.
    pub functions: bool,
    /// Reserved for future property/object metadata. Encoding refuses
    /// while this is set.
    pub metadata: bool,
}

/// Encode a value graph to its Serime text form.
pub fn to_string(value: &Value, options: Options) -> Result<String> {
    Encoder::new(options).serialize(value)
}

/// Decode a Serime text back into a value graph.
pub fn from_str(input: &str, registry: &ClassRegistry, options: Options) -> Result<Value> {
    Decoder::new(options, registry).deserialize(input)
}
