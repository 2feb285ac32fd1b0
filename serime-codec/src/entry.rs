//! Entry tokenizer
//!
//! Splits the body between the outermost `{` and `}` into fragments.
//! Delimiters only count at depth zero; the depth counter tracks both
//! braces and brackets, because key fragments wrap full value blocks.
//! Payload text cannot interfere: every reserved character inside payloads
//! is escaped before the body is assembled.

use serime_format::{Result, SerimeError};

/// Split an entry body into ordered `(key, value)` fragments.
///
/// The first depth-zero `:` ends the key; later depth-zero colons belong to
/// the value (accessibility prefixes). A depth-zero `,` emits the pair.
/// The empty body yields no pairs.
pub fn split_pairs(body: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut depth = 0i32;
    let mut buffer = String::new();
    let mut key: Option<String> = None;

    for c in body.chars() {
        match c {
            '{' | '[' => {
                depth += 1;
                buffer.push(c);
            }
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SerimeError::DecodeGrammar(
                        "unbalanced bracket in entry body".to_string(),
                    ));
                }
                buffer.push(c);
            }
            ':' if depth == 0 && key.is_none() => {
                key = Some(std::mem::take(&mut buffer));
            }
            ',' if depth == 0 => {
                let key = key.take().ok_or_else(|| {
                    SerimeError::DecodeGrammar("entry has no key separator".to_string())
                })?;
                pairs.push((key, std::mem::take(&mut buffer)));
            }
            _ => buffer.push(c),
        }
    }

    if depth != 0 {
        return Err(SerimeError::DecodeGrammar(
            "unbalanced bracket in entry body".to_string(),
        ));
    }
    match key {
        Some(key) => pairs.push((key, buffer)),
        None if buffer.is_empty() => {}
        None => {
            return Err(SerimeError::DecodeGrammar(
                "entry has no key separator".to_string(),
            ))
        }
    }
    Ok(pairs)
}

/// Split a set body into ordered member fragments on depth-zero commas.
pub fn split_items(body: &str) -> Result<Vec<String>> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut buffer = String::new();

    for c in body.chars() {
        match c {
            '{' | '[' => {
                depth += 1;
                buffer.push(c);
            }
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SerimeError::DecodeGrammar(
                        "unbalanced bracket in set body".to_string(),
                    ));
                }
                buffer.push(c);
            }
            ',' if depth == 0 => items.push(std::mem::take(&mut buffer)),
            _ => buffer.push(c),
        }
    }

    if depth != 0 {
        return Err(SerimeError::DecodeGrammar(
            "unbalanced bracket in set body".to_string(),
        ));
    }
    if !buffer.is_empty() || !items.is_empty() {
        items.push(buffer);
    }
    Ok(items)
}
