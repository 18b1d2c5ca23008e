//! Deep configuration comparison
//!
//! Comparison is one-way: the expected (desired) configuration drives which
//! fields are inspected, and unset values on both sides are equivalent no
//! matter their shape. Values are coerced the way the device firmware reads
//! them: numbers across int/float, numeric strings, truthiness for booleans,
//! and normalized bytes for key material.

use std::collections::BTreeSet;

use crate::bytes::{bytes_from_list, is_bytes_field, is_empty, normalize_bytes};
use crate::diff::ConfigDiff;
use crate::value::{ConfigMap, ConfigValue};

/// Section names the device uses as single-key envelopes
pub const ENVELOPE_KEYS: [&str; 9] = [
    "device",
    "lora",
    "position",
    "power",
    "network",
    "display",
    "bluetooth",
    "security",
    "channel",
];

/// Tolerance for comparisons involving a float
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Compare two values with type coercion
///
/// `field_name` is the leaf (or dotted) name of the field being compared;
/// key-material names switch to byte normalization, as does
/// `is_bytes_field`.
#[must_use]
pub fn values_equal(
    expected: &ConfigValue,
    actual: &ConfigValue,
    field_name: &str,
    is_bytes: bool,
) -> bool {
    let expected_empty = is_empty(expected);
    let actual_empty = is_empty(actual);
    if expected_empty || actual_empty {
        return expected_empty && actual_empty;
    }

    let bytes_field = is_bytes || is_bytes_field(field_name);

    match (expected, actual) {
        (ConfigValue::Map(e), ConfigValue::Map(a)) => compare_dicts(e, a, "").is_empty(),
        (ConfigValue::List(e), ConfigValue::List(a)) => compare_lists(e, a, field_name).is_none(),
        _ if bytes_field && (is_byte_like(expected) || is_byte_like(actual)) => {
            normalize_bytes(expected) == normalize_bytes(actual)
        }
        (ConfigValue::Int(e), ConfigValue::Int(a)) => e == a,
        (
            ConfigValue::Int(_) | ConfigValue::Float(_),
            ConfigValue::Int(_) | ConfigValue::Float(_),
        ) => match (expected.as_f64(), actual.as_f64()) {
            (Some(e), Some(a)) => (e - a).abs() < FLOAT_EPSILON,
            _ => false,
        },
        (ConfigValue::String(e), ConfigValue::String(a)) => e == a,
        (ConfigValue::Bytes(e), ConfigValue::Bytes(a)) => e == a,
        (ConfigValue::Bool(e), ConfigValue::Bool(a)) => e == a,
        (ConfigValue::String(text), number) | (number, ConfigValue::String(text))
            if number.is_number() =>
        {
            match (text.trim().parse::<f64>(), number.as_f64()) {
                (Ok(parsed), Some(n)) => parsed == n,
                _ => false,
            }
        }
        // Booleans are 0/1 against numbers and numeric text
        (ConfigValue::Bool(flag), number) | (number, ConfigValue::Bool(flag))
            if number.is_number() =>
        {
            number
                .as_f64()
                .is_some_and(|n| (n - bool_as_f64(*flag)).abs() < FLOAT_EPSILON)
        }
        (ConfigValue::Bool(flag), ConfigValue::String(text))
        | (ConfigValue::String(text), ConfigValue::Bool(flag)) => text
            .trim()
            .parse::<f64>()
            .is_ok_and(|parsed| parsed == bool_as_f64(*flag)),
        (ConfigValue::Bool(_), _) | (_, ConfigValue::Bool(_)) => {
            expected.is_truthy() == actual.is_truthy()
        }
        _ => expected.to_string() == actual.to_string(),
    }
}

fn bool_as_f64(flag: bool) -> f64 {
    f64::from(u8::from(flag))
}

fn is_byte_like(value: &ConfigValue) -> bool {
    matches!(
        value,
        ConfigValue::String(_) | ConfigValue::Bytes(_) | ConfigValue::List(_)
    )
}

/// Compare two sequences as a whole
///
/// Empty elements are dropped first. Key-material lists compare as sets of
/// normalized bytes, all-string lists as sets of strings, anything else
/// element-wise in order. Yields at most one diff for the whole list.
#[must_use]
pub fn compare_lists(
    expected: &[ConfigValue],
    actual: &[ConfigValue],
    field_name: &str,
) -> Option<ConfigDiff> {
    let expected: Vec<ConfigValue> = expected.iter().filter(|v| !is_empty(v)).cloned().collect();
    let actual: Vec<ConfigValue> = actual.iter().filter(|v| !is_empty(v)).cloned().collect();

    let equal = if is_bytes_field(field_name) {
        byte_set(&expected) == byte_set(&actual)
    } else if let (Some(e), Some(a)) = (string_set(&expected), string_set(&actual)) {
        e == a
    } else {
        let leaf = field_name.rsplit('.').next().unwrap_or(field_name);
        expected.len() == actual.len()
            && expected
                .iter()
                .zip(&actual)
                .all(|(e, a)| values_equal(e, a, leaf, false))
    };

    if equal {
        None
    } else {
        Some(ConfigDiff::mismatch(
            field_name,
            ConfigValue::List(expected),
            ConfigValue::List(actual),
        ))
    }
}

/// Key material as a set of byte strings; a plain list of byte values is one key
fn byte_set(items: &[ConfigValue]) -> BTreeSet<Vec<u8>> {
    match bytes_from_list(items) {
        Some(bytes) => BTreeSet::from([bytes]),
        None => items.iter().filter_map(normalize_bytes).collect(),
    }
}

fn string_set(items: &[ConfigValue]) -> Option<BTreeSet<&str>> {
    items.iter().map(ConfigValue::as_str).collect()
}

/// Recursively compare two mappings, driven by expected's keys
///
/// Keys only present in `actual` are not inspected here.
#[must_use]
pub fn compare_dicts(expected: &ConfigMap, actual: &ConfigMap, path: &str) -> Vec<ConfigDiff> {
    let mut diffs = Vec::new();

    for (key, expected_value) in expected {
        let full_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        let Some(actual_value) = actual.get(key) else {
            if !is_empty(expected_value) {
                diffs.push(ConfigDiff::missing(full_path, expected_value.clone()));
            }
            continue;
        };

        match (expected_value, actual_value) {
            (ConfigValue::Map(e), ConfigValue::Map(a)) => {
                diffs.extend(compare_dicts(e, a, &full_path));
            }
            (ConfigValue::List(e), ConfigValue::List(a)) => {
                diffs.extend(compare_lists(e, a, &full_path));
            }
            (ConfigValue::Map(_) | ConfigValue::List(_), _) => {
                if !is_empty(expected_value) {
                    diffs.push(ConfigDiff::type_mismatch(
                        full_path,
                        expected_value.clone(),
                        actual_value.clone(),
                    ));
                }
            }
            _ => {
                if !values_equal(expected_value, actual_value, key, is_bytes_field(key)) {
                    diffs.push(ConfigDiff::mismatch(
                        full_path,
                        expected_value.clone(),
                        actual_value.clone(),
                    ));
                }
            }
        }
    }

    diffs
}

/// Unwrap a single-key envelope such as `{"device": {...}}`
fn unwrap_envelope(value: &ConfigValue) -> Option<&ConfigValue> {
    let map = value.as_map()?;
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.first()?;
    ENVELOPE_KEYS.contains(&key.as_str()).then_some(inner)
}

/// Deep compare an expected configuration against the one on the node
///
/// Empty `expected` yields no diffs. Empty `actual` reports every non-empty
/// expected field as missing. Both sides are unwrapped from a single-key
/// section envelope first; `actual` is additionally unwrapped by
/// `config_type` when it holds that key. With `allow_undefined` disabled,
/// non-empty fields only present in `actual` are reported as extra.
#[must_use]
pub fn deep_compare(
    expected: &ConfigValue,
    actual: &ConfigValue,
    config_type: Option<&str>,
    allow_undefined: bool,
) -> Vec<ConfigDiff> {
    if is_empty(expected) {
        return Vec::new();
    }

    let root = config_type.unwrap_or_default();

    if is_empty(actual) {
        tracing::warn!(
            config_type = root,
            "deep_compare: actual config is empty, reporting expected fields as missing"
        );
        return match expected {
            ConfigValue::Map(map) => map
                .iter()
                .filter(|(_, v)| !is_empty(v))
                .map(|(k, v)| ConfigDiff::missing(k.clone(), v.clone()))
                .collect(),
            other => vec![ConfigDiff::missing(root, other.clone())],
        };
    }

    let expected = unwrap_envelope(expected).unwrap_or(expected);
    let actual = unwrap_envelope(actual)
        .or_else(|| config_type.and_then(|t| actual.get(t)))
        .unwrap_or(actual);

    match (expected, actual) {
        (ConfigValue::Map(e), ConfigValue::Map(a)) => {
            let mut diffs = compare_dicts(e, a, "");
            if !allow_undefined {
                diffs.extend(
                    a.iter()
                        .filter(|(k, v)| !e.contains_key(*k) && !is_empty(v))
                        .map(|(k, v)| ConfigDiff::extra(k.clone(), v.clone())),
                );
            }
            diffs
        }
        (ConfigValue::Map(_), _) | (_, ConfigValue::Map(_)) => {
            if values_equal(expected, actual, root, false) {
                Vec::new()
            } else {
                vec![ConfigDiff::type_mismatch(root, expected.clone(), actual.clone())]
            }
        }
        _ => {
            if values_equal(expected, actual, root, false) {
                Vec::new()
            } else {
                vec![ConfigDiff::mismatch(root, expected.clone(), actual.clone())]
            }
        }
    }
}

/// Whether two configurations have no differences
#[must_use]
pub fn configs_equal(
    expected: &ConfigValue,
    actual: &ConfigValue,
    config_type: Option<&str>,
) -> bool {
    deep_compare(expected, actual, config_type, true).is_empty()
}
