/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Returns true if `order_id` ends with `suffix`. Shops look orders up by the last few characters of the id that the
/// customer reads out, so the comparison ignores surrounding whitespace and ASCII case.
pub fn matches_id_suffix(order_id: &str, suffix: &str) -> bool {
    let suffix = suffix.trim();
    !suffix.is_empty() && order_id.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase())
}
