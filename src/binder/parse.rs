//! Value setters used by binding schemas.
//!
//! Every setter parses first and assigns only on success, so a rejected
//! value never leaves the target half-written.

use std::collections::BTreeMap;
use std::str::FromStr;

pub fn string(slot: &mut String, value: &str) -> bool {
    *slot = value.to_string();
    true
}

/// Case-insensitive `true`/`false`.
pub fn boolean(slot: &mut bool, value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => *slot = true,
        "false" => *slot = false,
        _ => return false,
    }
    true
}

pub fn number<T: FromStr>(slot: &mut T, value: &str) -> bool {
    match value.trim().parse() {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}

/// Comma-delimited list; entries are trimmed and empty entries dropped.
pub fn list(slot: &mut Vec<String>, value: &str) -> bool {
    *slot = value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    true
}

/// Comma-delimited `key:value` pairs.
pub fn map(slot: &mut BTreeMap<String, String>, value: &str) -> bool {
    let mut parsed = BTreeMap::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((k, v)) = entry.split_once(':') else {
            return false;
        };
        parsed.insert(k.trim().to_string(), v.trim().to_string());
    }
    *slot = parsed;
    true
}
