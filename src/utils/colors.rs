//! ANSI color helper utilities for terminal output.

use crate::models::action::Action;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// check-in → green, check-out → red
pub fn color_for_action(action: Action) -> &'static str {
    match action {
        Action::CheckIn => GREEN,
        Action::CheckOut => RED,
    }
}

/// Empty buckets are greyed out in the chart.
pub fn color_for_level(level: u32) -> &'static str {
    if level == 0 { GREY } else { CYAN }
}

pub fn colorize(value: &str, color: &str) -> String {
    format!("{color}{value}{RESET}")
}
