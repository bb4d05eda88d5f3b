//! User-facing terminal messages. Diagnostics go through `tracing` instead.

use std::fmt;
use std::io::Write;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const FG_BLUE: &str = "\x1b[34m";
const FG_GREEN: &str = "\x1b[32m";
const FG_YELLOW: &str = "\x1b[33m";
const FG_RED: &str = "\x1b[31m";
const FG_MAGENTA: &str = "\x1b[35m";

fn tagged(color: &str, icon: &str, msg: impl fmt::Display) -> String {
    format!("{color}{BOLD}{icon}{RESET} {msg}")
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", tagged(FG_BLUE, "ℹ️", msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", tagged(FG_GREEN, "✅", msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", tagged(FG_YELLOW, "⚠️", msg));
}

/// Errors go to stderr.
pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", tagged(FG_RED, "❌", msg));
}

/// Question without a trailing newline, so the answer is typed on the same line.
pub fn ask<T: fmt::Display>(msg: T) {
    print!("{} ", tagged(FG_MAGENTA, "❓", msg));
    let _ = std::io::stdout().flush();
}

pub fn header<T: fmt::Display>(msg: T) {
    println!("{FG_BLUE}{BOLD}=== {msg} ==={RESET}");
}
