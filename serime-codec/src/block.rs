//! Serialized-block extractor
//!
//! A block is the smallest self-contained serialized unit. The extractor
//! classifies one block string: optional key-index wrapper with its
//! property descriptor, optional accessibility prefix, reference
//! declaration/pointer, and the type tag with its payload.

use serime_format::{Result, SerimeError, TypeTag};

/// A reference mark attached to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefMark {
    /// `#<id>`: stand-in for a previously declared value
    Get(u32),
    /// `@<id>=`: declaration binding the id to the value that follows
    Set(u32),
}

/// The parsed anatomy of one block.
#[derive(Debug)]
pub struct BlockInfo {
    /// Reference declaration or pointer, if any
    pub reference: Option<RefMark>,
    /// Property descriptor bits from a key-index wrapper
    pub descriptor: Option<u32>,
    /// Object accessibility bits from a `%bits:` prefix
    pub accessibility: Option<u32>,
    /// The type tag; absent only for pure reference pointers
    pub tag: Option<TypeTag>,
    /// Payload text after `|`; absent for singletons and pointers
    pub payload: Option<String>,
    /// True when the block was wrapped in `[ … ]`
    pub is_key_index: bool,
}

fn parse_digits(text: &str, what: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SerimeError::DecodeGrammar(format!(
            "{what} '{text}' is not a digit run"
        )));
    }
    text.parse::<u32>()
        .map_err(|_| SerimeError::DecodeGrammar(format!("{what} '{text}' overflows")))
}

/// Byte index of the `]` matching the `[` at position 0.
fn matching_close(block: &str) -> Result<usize> {
    let mut depth = 0i32;
    for (i, c) in block.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(SerimeError::DecodeGrammar(
        "key index bracket never closes".to_string(),
    ))
}

/// Split a key fragment `[<inner>]%<digits>` into the inner block and the
/// optional descriptor bits.
pub fn split_key(fragment: &str) -> Result<(&str, Option<u32>)> {
    if !fragment.starts_with('[') {
        return Err(SerimeError::DecodeGrammar(format!(
            "entry key '{fragment}' is not index-wrapped"
        )));
    }
    let close = matching_close(fragment)?;
    let after = &fragment[close + 1..];
    let descriptor = if after.is_empty() {
        None
    } else {
        let digits = after.strip_prefix('%').ok_or_else(|| {
            SerimeError::DecodeGrammar(format!("unexpected text after key index: '{after}'"))
        })?;
        Some(parse_digits(digits, "property descriptor")?)
    };
    Ok((&fragment[1..close], descriptor))
}

impl BlockInfo {
    /// Extract the anatomy of one block.
    pub fn parse(block: &str) -> Result<Self> {
        let mut info = BlockInfo {
            reference: None,
            descriptor: None,
            accessibility: None,
            tag: None,
            payload: None,
            is_key_index: false,
        };

        let mut rest = block;

        if rest.starts_with('[') {
            info.is_key_index = true;
            let close = matching_close(rest)?;
            let after = &rest[close + 1..];
            if !after.is_empty() {
                let digits = after.strip_prefix('%').ok_or_else(|| {
                    SerimeError::DecodeGrammar(format!(
                        "unexpected text after key index: '{after}'"
                    ))
                })?;
                info.descriptor = Some(parse_digits(digits, "property descriptor")?);
            }
            rest = &rest[1..close];
        }

        if let Some(after_mark) = rest.strip_prefix('%') {
            let digit_len = after_mark
                .bytes()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if digit_len == 0 || after_mark.as_bytes().get(digit_len) != Some(&b':') {
                return Err(SerimeError::DecodeGrammar(
                    "accessibility prefix is not '%<digits>:'".to_string(),
                ));
            }
            info.accessibility = Some(parse_digits(&after_mark[..digit_len], "accessibility")?);
            rest = &after_mark[digit_len + 1..];
        }

        if let Some(after) = rest.strip_prefix('@') {
            let eq = after.find('=').ok_or_else(|| {
                SerimeError::DecodeGrammar("reference declaration has no '='".to_string())
            })?;
            info.reference = Some(RefMark::Set(parse_digits(&after[..eq], "reference id")?));
            rest = &after[eq + 1..];
        } else if let Some(after) = rest.strip_prefix('#') {
            info.reference = Some(RefMark::Get(parse_digits(after, "reference id")?));
            return Ok(info);
        }

        match rest.find('|') {
            Some(pos) => {
                info.tag = Some(TypeTag::parse(&rest[..pos])?);
                info.payload = Some(rest[pos + 1..].to_string());
            }
            None => {
                let tag = TypeTag::parse(rest)?;
                if !tag.is_singleton() {
                    return Err(SerimeError::DecodeGrammar(format!(
                        "non-singleton tag '{rest}' has no payload separator"
                    )));
                }
                info.tag = Some(tag);
            }
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_blocks() {
        let info = BlockInfo::parse("0").unwrap();
        assert_eq!(info.tag, Some(TypeTag::Null));
        assert!(info.payload.is_none());

        let info = BlockInfo::parse("10").unwrap();
        assert_eq!(info.tag, Some(TypeTag::Undefined));
    }

    #[test]
    fn test_plain_value_block() {
        let info = BlockInfo::parse("2|-0").unwrap();
        assert_eq!(info.tag, Some(TypeTag::Number));
        assert_eq!(info.payload.as_deref(), Some("-0"));
        assert!(info.reference.is_none());
        assert!(!info.is_key_index);
    }

    #[test]
    fn test_missing_separator_for_non_singleton() {
        assert!(matches!(
            BlockInfo::parse("2"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }

    #[test]
    fn test_reference_set_block() {
        let info = BlockInfo::parse("@4=3|{}").unwrap();
        assert_eq!(info.reference, Some(RefMark::Set(4)));
        assert_eq!(info.tag, Some(TypeTag::Object));
        assert_eq!(info.payload.as_deref(), Some("{}"));
    }

    #[test]
    fn test_reference_get_block() {
        let info = BlockInfo::parse("#12").unwrap();
        assert_eq!(info.reference, Some(RefMark::Get(12)));
        assert!(info.tag.is_none());
        assert!(info.payload.is_none());
    }

    #[test]
    fn test_bad_reference_digits() {
        for block in ["#", "#x", "@=1|a", "@1x=1|a"] {
            assert!(
                matches!(BlockInfo::parse(block), Err(SerimeError::DecodeGrammar(_))),
                "block {block:?} should be a grammar error"
            );
        }
    }

    #[test]
    fn test_key_index_with_descriptor() {
        let info = BlockInfo::parse("[1|a]%7").unwrap();
        assert!(info.is_key_index);
        assert_eq!(info.descriptor, Some(7));
        assert_eq!(info.tag, Some(TypeTag::Str));
        assert_eq!(info.payload.as_deref(), Some("a"));
    }

    #[test]
    fn test_key_index_without_descriptor() {
        let info = BlockInfo::parse("[2|3]").unwrap();
        assert!(info.is_key_index);
        assert!(info.descriptor.is_none());
        assert_eq!(info.tag, Some(TypeTag::Number));
    }

    #[test]
    fn test_key_index_with_nested_brackets() {
        let info = BlockInfo::parse("[3|{[1|a]%7:2|1}]%7").unwrap();
        assert!(info.is_key_index);
        assert_eq!(info.descriptor, Some(7));
        assert_eq!(info.tag, Some(TypeTag::Object));
        assert_eq!(info.payload.as_deref(), Some("{[1|a]%7:2|1}"));
    }

    #[test]
    fn test_accessibility_prefix() {
        let info = BlockInfo::parse("%3:4|{}").unwrap();
        assert_eq!(info.accessibility, Some(3));
        assert_eq!(info.tag, Some(TypeTag::Array));

        let info = BlockInfo::parse("%1:@0=3|{}").unwrap();
        assert_eq!(info.accessibility, Some(1));
        assert_eq!(info.reference, Some(RefMark::Set(0)));
    }

    #[test]
    fn test_malformed_accessibility_prefix() {
        assert!(matches!(
            BlockInfo::parse("%:3|{}"),
            Err(SerimeError::DecodeGrammar(_))
        ));
        assert!(matches!(
            BlockInfo::parse("%7"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }

    #[test]
    fn test_custom_tag_block() {
        let info = BlockInfo::parse("$0|{}").unwrap();
        assert_eq!(info.tag, Some(TypeTag::Custom(0)));
    }

    #[test]
    fn test_unclosed_key_index() {
        assert!(matches!(
            BlockInfo::parse("[1|a"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }

    #[test]
    fn test_split_key() {
        let (inner, descriptor) = split_key("[1|a]%7").unwrap();
        assert_eq!(inner, "1|a");
        assert_eq!(descriptor, Some(7));

        let (inner, descriptor) = split_key("[#3]").unwrap();
        assert_eq!(inner, "#3");
        assert_eq!(descriptor, None);

        assert!(matches!(
            split_key("1|a"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }

    #[test]
    fn test_trailing_garbage_after_key_index() {
        assert!(matches!(
            BlockInfo::parse("[1|a]x"),
            Err(SerimeError::DecodeGrammar(_))
        ));
    }
}
