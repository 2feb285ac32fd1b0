//! Error types for the Serime format

use thiserror::Error;

/// Serime error taxonomy
///
/// Every error is fatal for the current encode or decode call; partial
/// output is discarded and nothing is retried.
#[derive(Debug, Error)]
pub enum SerimeError {
    /// A value the encoder cannot represent (disabled feature, native
    /// function source, accessor/metadata descriptor bits).
    #[error("unsupported value for encoding: {0}")]
    EncodeTypeUnsupported(String),
    /// A property descriptor was requested for an absent property.
    #[error("property missing during encode: {0}")]
    EncodePropertyMissing(String),
    /// Malformed input text: unbalanced brackets, bad reference digits,
    /// missing separators, missing descriptor flags.
    #[error("malformed input: {0}")]
    DecodeGrammar(String),
    /// Reference bookkeeping failure: unbound id, duplicate dependency
    /// name, dependency not supplied by the caller.
    #[error("reference error: {0}")]
    DecodeReference(String),
    /// A type tag the decoder does not recognize, or a custom tag with no
    /// registered dependency.
    #[error("unknown type: {0}")]
    DecodeTypeUnknown(String),
    /// A block that requires a capability the configuration does not grant.
    #[error("decode policy violation: {0}")]
    DecodePolicy(String),
    /// Flag enum or flag integer validation failure.
    #[error("invalid bitflag: {0}")]
    BitflagInvalid(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SerimeError>;
