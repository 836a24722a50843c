// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarHub.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Lenient field access on vendor JSON.
//!
//! Vendors send numbers as numbers or as strings depending on endpoint and
//! firmware, so every numeric getter accepts both. Missing keys, `null` and
//! unparseable text all read as absent.

use serde_json::Value;

/// String field; numbers are rendered, anything else reads as empty
pub(crate) fn get_str(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn get_f64(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub(crate) fn get_f64_or_zero(value: &Value, key: &str) -> f64 {
    get_f64(value, key).unwrap_or(0.0)
}

#[expect(clippy::cast_possible_truncation)]
pub(crate) fn get_i64(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// First present numeric field among `keys`
pub(crate) fn first_f64(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| get_f64(value, key))
}

/// Array field; absent or non-array reads as empty
pub(crate) fn get_array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_as_strings() {
        let data = json!({
            "a": 1.5,
            "b": " 2.25 ",
            "c": "n/a",
            "d": null,
            "e": "7",
            "f": 9.9
        });

        assert_eq!(get_f64(&data, "a"), Some(1.5));
        assert_eq!(get_f64(&data, "b"), Some(2.25));
        assert_eq!(get_f64(&data, "c"), None);
        assert_eq!(get_f64(&data, "d"), None);
        assert_eq!(get_f64(&data, "missing"), None);
        assert_eq!(get_f64_or_zero(&data, "c"), 0.0);
        assert_eq!(get_i64(&data, "e"), Some(7));
        assert_eq!(get_i64(&data, "f"), Some(9));
        assert_eq!(first_f64(&data, &["missing", "c", "b"]), Some(2.25));
    }

    #[test]
    fn test_strings_and_arrays() {
        let data = json!({"id": 1000, "name": "Roof", "rows": [1, 2], "flag": true});
        assert_eq!(get_str(&data, "id"), "1000");
        assert_eq!(get_str(&data, "name"), "Roof");
        assert_eq!(get_str(&data, "flag"), "true");
        assert_eq!(get_str(&data, "rows"), "");
        assert_eq!(get_array(&data, "rows").len(), 2);
        assert!(get_array(&data, "name").is_empty());
        assert!(get_array(&Value::Null, "rows").is_empty());
        assert_eq!(non_empty(String::new()), None);
    }
}
