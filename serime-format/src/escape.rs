//! Reserved-character escape codec
//!
//! Every reserved character becomes `&<decimal code point>;` on the way
//! into the stream. Non-reserved characters, including whitespace, pass
//! through untouched. Both directions are total and
//! `unescape(escape(s)) == s` for any Unicode string.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::constants::RESERVED;

static ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(\d+);").expect("escape pattern"));

/// Escape every reserved character in `input`.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if RESERVED.contains(&c) {
            out.push('&');
            out.push_str(&(c as u32).to_string());
            out.push(';');
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverse [`escape`]. Sequences whose digits do not name a valid Unicode
/// scalar value are left untouched.
pub fn unescape(input: &str) -> String {
    ESCAPED
        .replace_all(input, |caps: &Captures<'_>| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// True when `input` contains no raw reserved character, i.e. it is safe to
/// embed as a payload fragment.
pub fn is_clean(input: &str) -> bool {
    !input.chars().any(|c| RESERVED.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_reserved_characters() {
        assert_eq!(escape("a,b"), "a&44;b");
        assert_eq!(escape("{x}"), "&123;x&125;");
        assert_eq!(escape("&;"), "&38;&59;");
    }

    #[test]
    fn test_escape_passes_plain_text() {
        assert_eq!(escape("hello world\n\t"), "hello world\n\t");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for s in ["a,b", "{[|]}", "&1;&2;", "tilde~colon:", "日本語, emoji 🚀"] {
            assert_eq!(unescape(&escape(s)), s);
        }
    }

    #[test]
    fn test_unescape_ignores_invalid_code_points() {
        // 55296 is a surrogate; not a valid scalar value
        assert_eq!(unescape("&55296;"), "&55296;");
        assert_eq!(unescape("&99999999999;"), "&99999999999;");
    }

    #[test]
    fn test_escaped_output_is_clean() {
        assert!(is_clean(&escape("a,b{c}:d").replace(&['&', ';'][..], "")));
        // the only reserved characters left are the escape frame itself
        let escaped = escape("a,b");
        assert!(escaped
            .chars()
            .filter(|c| RESERVED.contains(c))
            .all(|c| c == '&' || c == ';'));
    }
}
