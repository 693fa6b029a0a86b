use std::str::FromStr;

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

/// Parse an optional raw value into `T`.
///
/// Returns `Ok(None)` when no value was supplied, so that callers can distinguish "not set" from "set, but invalid"
/// and log accordingly.
pub fn parse_env_value<T: FromStr>(value: Option<String>) -> Result<Option<T>, T::Err> {
    value.map(|v| v.trim().parse::<T>()).transpose()
}
