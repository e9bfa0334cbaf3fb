//! Formatting helpers for the run summary.

const BYTE_UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Format a byte count with binary units.
///
/// # Examples
///
/// ```
/// use ar_cli_common::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 bytes");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < BYTE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", BYTE_UNITS[unit])
}

/// Format a count with thousands separators.
///
/// # Examples
///
/// ```
/// use ar_cli_common::format_number;
///
/// assert_eq!(format_number(999), "999");
/// assert_eq!(format_number(1_204_533), "1,204,533");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let lead = digits.len() % 3;

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a duration in seconds as `1h 02m 03s`, `4m 05s` or `6.70s`.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{secs:.2}s");
    }
    let total = secs as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}
