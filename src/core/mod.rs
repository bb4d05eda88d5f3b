pub mod calculator;
pub mod config;
pub mod guard;
pub mod log;
pub mod occupancy;
pub mod presence;
pub mod scanner;
pub mod stale;
pub mod timeline;
