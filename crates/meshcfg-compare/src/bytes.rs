//! Emptiness and byte-field normalization
//!
//! Key material (`psk`, `admin_key`, ...) is base64 by convention but may
//! arrive hex-encoded from legacy callers, as raw bytes from the device, or
//! as a list of byte values from a JSON form. All of them normalize to one
//! canonical byte sequence here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::value::ConfigValue;

/// Field names holding key material, compared case-insensitively
pub const BYTES_FIELDS: [&str; 4] = ["psk", "admin_key", "private_key", "public_key"];

/// Whether `field_name` names a key-material field
///
/// Only the last dot-separated segment is considered, so nested paths such
/// as `security.admin_key` are recognized.
#[must_use]
pub fn is_bytes_field(field_name: &str) -> bool {
    let leaf = field_name.rsplit('.').next().unwrap_or(field_name);
    BYTES_FIELDS
        .iter()
        .any(|name| leaf.eq_ignore_ascii_case(name))
}

/// Whether a value counts as unset
///
/// Null, empty string, empty sequence, empty mapping and empty byte string
/// are empty. Zero and `false` are not.
#[must_use]
pub fn is_empty(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Null => true,
        ConfigValue::String(s) => s.is_empty(),
        ConfigValue::Bytes(b) => b.is_empty(),
        ConfigValue::List(items) => items.is_empty(),
        ConfigValue::Map(map) => map.is_empty(),
        ConfigValue::Bool(_) | ConfigValue::Int(_) | ConfigValue::Float(_) => false,
    }
}

/// Canonicalize a byte-like value
///
/// Strings are tried as standard base64 first, then hex, then taken as
/// UTF-8. Lists must hold integers in `0..=255`. Returns `None` for empty
/// or undecodable input.
#[must_use]
pub fn normalize_bytes(value: &ConfigValue) -> Option<Vec<u8>> {
    match value {
        ConfigValue::Bytes(b) if !b.is_empty() => Some(b.clone()),
        ConfigValue::List(items) => bytes_from_list(items),
        ConfigValue::String(s) if !s.is_empty() => Some(decode_text(s)),
        _ => None,
    }
}

/// Bytes of a non-empty list of integers in `0..=255`
pub(crate) fn bytes_from_list(items: &[ConfigValue]) -> Option<Vec<u8>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| match item {
            ConfigValue::Int(i) => u8::try_from(*i).ok(),
            _ => None,
        })
        .collect()
}

fn decode_text(text: &str) -> Vec<u8> {
    if let Ok(decoded) = STANDARD.decode(text) {
        if !decoded.is_empty() {
            return decoded;
        }
    }
    if let Ok(decoded) = hex::decode(text) {
        if !decoded.is_empty() {
            return decoded;
        }
    }
    text.as_bytes().to_vec()
}
