//! Reserved characters and structural tokens for the Serime grammar

/// The fixed reserved character set. Any occurrence inside user text is
/// escaped to `&<decimal>;` before it reaches the output stream, so every
/// raw occurrence in a serialized string is structural.
pub const RESERVED: [char; 16] = [
    '&', ';', '!', '@', '#', '%', '[', ']', '{', '}', '|', ',', '=', '$', ':', '~',
];

/// Escape sequence opener
pub const ESCAPE_OPEN: char = '&';
/// Escape sequence terminator
pub const ESCAPE_CLOSE: char = ';';

/// Reference declaration marker (`@<id>=`)
pub const REF_DECLARE: char = '@';
/// Reference pointer marker (`#<id>`)
pub const REF_POINTER: char = '#';
/// Reference declaration separator
pub const REF_ASSIGN: char = '=';

/// Type/payload separator
pub const PAYLOAD_SEP: char = '|';
/// Custom type tag marker (`$<index>`)
pub const CUSTOM_MARK: char = '$';

/// Entry body opener
pub const ENTRIES_OPEN: char = '{';
/// Entry body closer
pub const ENTRIES_CLOSE: char = '}';
/// Entry key opener
pub const KEY_OPEN: char = '[';
/// Entry key closer
pub const KEY_CLOSE: char = ']';
/// Entry separator
pub const ENTRY_SEP: char = ',';
/// Key/value separator, also terminates a flag prefix
pub const FLAG_SEP: char = ':';
/// Flag prefix marker (`%<bits>`)
pub const FLAG_MARK: char = '%';
/// Function name/source separator
pub const FUNCTION_SEP: char = '~';

/// Dependency prelude opener (`![`)
pub const DEPS_OPEN: &str = "![";
/// Dependency prelude closer (`]!`)
pub const DEPS_CLOSE: &str = "]!";

/// Boolean payloads
pub const BOOL_TRUE: &str = "T";
/// Boolean payloads
pub const BOOL_FALSE: &str = "F";

/// Non-finite number payloads
pub const NUMBER_NAN: &str = "NaN";
/// Non-finite number payloads
pub const NUMBER_INF: &str = "Infinity";
/// Non-finite number payloads
pub const NUMBER_NEG_INF: &str = "-Infinity";

/// Marker text identifying a function whose source cannot be reproduced
pub const NATIVE_SOURCE_MARK: &str = "[native code]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_set_is_duplicate_free() {
        for (i, a) in RESERVED.iter().enumerate() {
            for b in RESERVED.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_structural_tokens_are_reserved() {
        for c in [
            REF_DECLARE,
            REF_POINTER,
            REF_ASSIGN,
            PAYLOAD_SEP,
            CUSTOM_MARK,
            ENTRIES_OPEN,
            ENTRIES_CLOSE,
            KEY_OPEN,
            KEY_CLOSE,
            ENTRY_SEP,
            FLAG_SEP,
            FLAG_MARK,
            FUNCTION_SEP,
        ] {
            assert!(RESERVED.contains(&c), "token {c:?} must be reserved");
        }
    }
}
