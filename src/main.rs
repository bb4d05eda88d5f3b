//! rPresence main entrypoint.

use rpresence::run;
use rpresence::ui::messages::error;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so command output stays clean.
/// `RPRESENCE_LOG` wins over `RUST_LOG`; default level is `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("RPRESENCE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        if e.is_silent() {
            return;
        }
        error(&e);
        std::process::exit(1);
    }
}
