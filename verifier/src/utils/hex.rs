use std::sync::LazyLock;

use regex::Regex;

static ADDRESS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address regex is valid"));

/// Prefix `value` with `0x`, lowercasing it when the prefix had to be added.
///
/// Blank input and the literal `null` map to an empty string.
pub fn add_hex(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return String::new();
    }
    if value.starts_with("0x") {
        return value.to_string();
    }
    format!("0x{}", value).to_lowercase()
}

pub fn trim_hex(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

/// Accepts a 20-byte address, with or without `0x`, in any letter case.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_REGEX.is_match(&add_hex(address))
}
