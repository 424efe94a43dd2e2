use crate::codec::scalar::{encode_integer, encode_timestamp};
use crate::common::parse_iso_datetime;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Characters permitted in a blob tag value besides the escape character.
///
/// The full tag alphabet is `[A-Za-z0-9 .\-/:_]`; `_` is reserved as the
/// escape introducer and is itself escaped by doubling.
fn is_plain_tag_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '.' | '-' | '/' | ':')
}

/// Encodes a field value into the restricted blob-tag alphabet.
///
/// Equality in the source domain corresponds to byte equality in the encoded
/// domain, and lexicographic ordering is preserved for values that support
/// range predicates (integers and timestamps via their order-preserving
/// renderings, strings via the escape scheme).
///
/// Returns `None` for value types that have no tag encoding (null, arrays,
/// objects, and floats with a fractional part); the write path skips tagging
/// such fields.
pub fn encode_tag_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => match parse_iso_datetime(text) {
            Some(dt) => Some(encode_timestamp(&dt)),
            None => Some(escape(text)),
        },
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(encode_integer(int))
            } else if let Some(float) = number.as_f64() {
                // only degenerate floats are representable in the ordered form
                if float.fract() == 0.0 && float >= i64::MIN as f64 && float <= i64::MAX as f64 {
                    Some(encode_integer(float as i64))
                } else {
                    None
                }
            } else {
                None
            }
        }
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Decodes a tag value produced by [`encode_tag_value`]'s escape scheme back
/// into the source string.
///
/// Escaped byte runs are reassembled as UTF-8; runs that do not form valid
/// UTF-8 are interpreted as individually escaped code points below `0x100`.
pub fn decode_tag_value(tag: &str) -> String {
    let mut result = String::with_capacity(tag.len());
    let mut pending: Vec<u8> = Vec::new();
    let chars: Vec<char> = tag.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '_' {
            if i + 1 < chars.len() && chars[i + 1] == '_' {
                flush_escaped_run(&mut result, &mut pending);
                result.push('_');
                i += 2;
                continue;
            }
            if i + 2 < chars.len() {
                let hex: String = chars[i + 1..i + 3].iter().collect();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    pending.push(byte);
                    i += 3;
                    continue;
                }
            }
            // stray underscore with no valid escape; keep it verbatim
            flush_escaped_run(&mut result, &mut pending);
            result.push('_');
            i += 1;
        } else {
            flush_escaped_run(&mut result, &mut pending);
            result.push(chars[i]);
            i += 1;
        }
    }
    flush_escaped_run(&mut result, &mut pending);
    result
}

/// Computes the hashed tag form of a field value: lowercase hexadecimal of
/// SHA-256 over the UTF-8 bytes of the source value.
///
/// Hashed tags support equality only; they are used for unique fields whose
/// natural values could overflow or collide under the reversible encoding.
/// Returns `None` for value types that have no source string form.
pub fn hash_tag_value(value: &Value) -> Option<String> {
    let source = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    Some(hash_str(&source))
}

/// SHA-256 of a string, rendered as lowercase hex.
pub fn hash_str(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '_' {
            escaped.push_str("__");
        } else if is_plain_tag_char(ch) {
            escaped.push(ch);
        } else if (ch as u32) < 0x100 {
            let _ = write!(escaped, "_{:02X}", ch as u32);
        } else {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).as_bytes() {
                let _ = write!(escaped, "_{:02X}", byte);
            }
        }
    }
    escaped
}

fn flush_escaped_run(result: &mut String, pending: &mut Vec<u8>) {
    if pending.is_empty() {
        return;
    }
    match std::str::from_utf8(pending) {
        Ok(text) => result.push_str(text),
        Err(_) => {
            for byte in pending.iter() {
                if let Some(ch) = char::from_u32(*byte as u32) {
                    result.push(ch);
                }
            }
        }
    }
    pending.clear();
}
