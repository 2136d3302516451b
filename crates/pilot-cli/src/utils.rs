//! Shared utilities

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Collapse a multi-line text into one line for list output.
pub fn one_line(s: &str, max: usize) -> String {
    truncate_chars(&s.split_whitespace().collect::<Vec<_>>().join(" "), max)
}

/// Parse an on/off style argument.
pub fn parse_switch(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "enable" => Some(true),
        "off" | "false" | "no" | "0" | "disable" => Some(false),
        _ => None,
    }
}
