//! Formatting utilities used for CLI outputs.

pub fn mins2readable(mins: i64, short: bool) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;
    let sign = if mins < 0 { "-" } else { "" };

    if short {
        // e.g. 02:25
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        // e.g. 02h 25m
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

/// Horizontal bar for the occupancy chart; one block per person, capped at `max_width`.
pub fn bar(level: u32, max_width: usize) -> String {
    let n = usize::try_from(level).unwrap_or(usize::MAX).min(max_width);
    let mut s = "█".repeat(n);
    if usize::try_from(level).unwrap_or(usize::MAX) > max_width {
        s.push('…');
    }
    s
}
