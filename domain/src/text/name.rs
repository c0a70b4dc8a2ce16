//! Display name clean-up.

/// Turns "Last, First" into "First Last".
///
/// Only applies when the name contains exactly one comma with non-empty text on
/// both sides. Anything else comes back trimmed but otherwise unchanged.
pub fn reformat_name(raw: &str) -> String {
    let name = raw.trim();

    let mut parts = name.split(',');
    if let (Some(last), Some(first), None) = (parts.next(), parts.next(), parts.next()) {
        let (last, first) = (last.trim(), first.trim());
        if !last.is_empty() && !first.is_empty() {
            return format!("{first} {last}");
        }
    }

    name.to_string()
}

/// Collapses runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
