//! Display formatting for byte sizes.

const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// Human-readable size in binary units, matching how document limits are
/// configured.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else if value.fract() == 0.0 {
        format!("{} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
