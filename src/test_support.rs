//! Synthetic archive lines for unit tests.

use crate::utils::constants::COLUMN_WIDTHS;

/// Mandatory slots of a plausible 722315-53917 observation at 2014-01-01 00:53 UTC
pub fn mandatory_slots() -> Vec<String> {
    [
        "0123", "722315", "53917", "2014", "01", "01", "00", "53", "4", "+30033", "-090267",
        "FM-15", "+0001", "99999", "V020", "360", "1", "N", "0041", "1", "00610", "1", "M", "N",
        "016093", "1", "9", "9", "+0078", "1", "-0011", "1", "10268", "1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Build a record line from the default slots with some slots replaced,
/// followed by the given variable section
pub fn record_line(overrides: &[(usize, &str)], variable: &str) -> String {
    let mut slots = mandatory_slots();
    for &(index, value) in overrides {
        assert_eq!(value.len(), COLUMN_WIDTHS[index], "width of slot {}", index);
        slots[index] = value.to_string();
    }
    let mut line = slots.concat();
    line.push_str(variable);
    line
}

/// Record at a given UTC date and time
pub fn record_at(year: &str, month: &str, day: &str, hour: &str, minute: &str, variable: &str) -> String {
    record_line(
        &[(3, year), (4, month), (5, day), (6, hour), (7, minute)],
        variable,
    )
}
