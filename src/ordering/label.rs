//! Machine-generated meal labels ("Meal 3").
//!
//! A label is regenerated only while the row is flagged as carrying a
//! generated label and the text is still the canonical label of its
//! position. Once a caller names a meal the flag is cleared for good, even
//! if the chosen name looks like "Meal N".

const PREFIX: &str = "Meal ";

/// Canonical label for a meal at `position`.
pub fn auto_label(position: i64) -> String {
    format!("{}{}", PREFIX, position)
}

pub fn is_auto_label(label: &str, position: i64) -> bool {
    label.strip_prefix(PREFIX) == Some(position.to_string().as_str())
}

/// Label a meal should carry after moving from `old` to `new`. `auto` is
/// the row's generated-label flag.
pub fn resync(label: &str, auto: bool, old: i64, new: i64) -> String {
    if auto && is_auto_label(label, old) {
        auto_label(new)
    } else {
        label.to_string()
    }
}
