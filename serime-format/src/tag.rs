//! Type tag model
//!
//! Native shorthand tags occupy 0..12; custom-class tags render as `$N`
//! where `N` indexes the dependency table.

use crate::error::{Result, SerimeError};
use crate::value::Value;

/// Type tag for one serialized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// Null singleton
    Null,
    /// Unicode string
    Str,
    /// IEEE double, including NaN, ±Infinity and -0
    Number,
    /// Unordered key→value mapping with property descriptors
    Object,
    /// Ordered sequence with property descriptors
    Array,
    /// Mapping with arbitrary keys
    Map,
    /// Unordered unique values
    Set,
    /// Well-known named symbol
    Symbol,
    /// Boolean
    Bool,
    /// Function source text
    Function,
    /// Undefined singleton
    Undefined,
    /// Arbitrary-precision integer
    BigInt,
    /// Timestamp
    Date,
    /// Instance of the Nth custom class in the dependency table
    Custom(u32),
}

impl TypeTag {
    /// Render the tag for the wire (`"7"`, `"$3"`).
    pub fn render(&self) -> String {
        match self {
            TypeTag::Null => "0".to_string(),
            TypeTag::Str => "1".to_string(),
            TypeTag::Number => "2".to_string(),
            TypeTag::Object => "3".to_string(),
            TypeTag::Array => "4".to_string(),
            TypeTag::Map => "5".to_string(),
            TypeTag::Set => "6".to_string(),
            TypeTag::Symbol => "7".to_string(),
            TypeTag::Bool => "8".to_string(),
            TypeTag::Function => "9".to_string(),
            TypeTag::Undefined => "10".to_string(),
            TypeTag::BigInt => "11".to_string(),
            TypeTag::Date => "12".to_string(),
            TypeTag::Custom(n) => format!("${n}"),
        }
    }

    /// Parse the tag field of a block.
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(digits) = text.strip_prefix('$') {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SerimeError::DecodeGrammar(format!(
                    "custom tag '{text}' is not numeric"
                )));
            }
            let id = digits.parse::<u32>().map_err(|_| {
                SerimeError::DecodeGrammar(format!("custom tag '{text}' overflows"))
            })?;
            return Ok(TypeTag::Custom(id));
        }
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SerimeError::DecodeGrammar(format!(
                "type tag '{text}' is not numeric"
            )));
        }
        match text {
            "0" => Ok(TypeTag::Null),
            "1" => Ok(TypeTag::Str),
            "2" => Ok(TypeTag::Number),
            "3" => Ok(TypeTag::Object),
            "4" => Ok(TypeTag::Array),
            "5" => Ok(TypeTag::Map),
            "6" => Ok(TypeTag::Set),
            "7" => Ok(TypeTag::Symbol),
            "8" => Ok(TypeTag::Bool),
            "9" => Ok(TypeTag::Function),
            "10" => Ok(TypeTag::Undefined),
            "11" => Ok(TypeTag::BigInt),
            "12" => Ok(TypeTag::Date),
            other => Err(SerimeError::DecodeTypeUnknown(format!(
                "type tag {other} is not assigned"
            ))),
        }
    }

    /// Null or undefined: serialized as a bare tag with no payload.
    pub fn is_singleton(&self) -> bool {
        matches!(self, TypeTag::Null | TypeTag::Undefined)
    }

    /// Types whose payload is a `{…}` entry body.
    pub fn is_entried(&self) -> bool {
        matches!(
            self,
            TypeTag::Object | TypeTag::Array | TypeTag::Map | TypeTag::Set | TypeTag::Custom(_)
        )
    }

    /// True for `$N` tags.
    pub fn is_custom(&self) -> bool {
        matches!(self, TypeTag::Custom(_))
    }

    /// The dependency-table index of a custom tag.
    pub fn custom_id(&self) -> Option<u32> {
        match self {
            TypeTag::Custom(n) => Some(*n),
            _ => None,
        }
    }

    /// The canonical value of a singleton tag.
    pub fn singleton_value(&self) -> Option<Value> {
        match self {
            TypeTag::Null => Some(Value::Null),
            TypeTag::Undefined => Some(Value::Undefined),
            _ => None,
        }
    }
}
