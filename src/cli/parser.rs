use clap::{Parser, Subcommand};

/// Command-line interface definition for rPresence
/// Check-in/check-out presence tracking backed by SQLite
#[derive(Parser)]
#[command(
    name = "rpresence",
    version = env!("CARGO_PKG_VERSION"),
    about = "Presence tracking CLI: scan in and out, see live occupancy and today's curve, fix forgotten check-outs",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Act as this user instead of the configured one
    #[arg(global = true, long = "user")]
    pub user: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Feed decoded scan payloads to one scanner session
    ///
    /// Payload format: rpresence:<location>[:in|out]. Several payloads are
    /// delivered as concurrent decode callbacks, like consecutive camera frames.
    Scan {
        #[arg(required = true, num_args = 1.., value_name = "PAYLOAD")]
        payloads: Vec<String>,

        #[arg(
            long = "gap-ms",
            default_value_t = 0,
            help = "Delay between consecutive decode callbacks, in milliseconds"
        )]
        gap_ms: u64,
    },

    /// Show the presence of the current user
    Status {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Show the live occupancy count
    Occupancy {
        #[arg(long = "loc", help = "Location code: M=Main, A=Annex, L=Lab, S=Studio")]
        loc: Option<String>,

        #[arg(long, help = "Skip the aggregate query and fold the event log")]
        fallback: bool,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Show today's occupancy curve, rebuilt from the event log
    Timeline {
        #[arg(long = "loc", help = "Location code (default from config)")]
        loc: Option<String>,

        #[arg(long = "bucket", help = "Bucket width in minutes (default from config)")]
        bucket: Option<i64>,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// List raw occupancy events
    Events {
        #[arg(long = "loc")]
        loc: Option<String>,

        #[arg(long = "all-users", help = "Show events of every user")]
        all_users: bool,

        #[arg(long = "since", value_name = "YYYY-MM-DD", help = "Only events from this day on")]
        since: Option<String>,

        #[arg(long = "today", help = "Only today's events")]
        today: bool,
    },

    /// Close a stale session with an explicit duration
    Correct {
        #[arg(long = "minutes", help = "How long you actually stayed, in minutes")]
        minutes: String,
    },

    /// Watch the open session and ask for a correction once it goes stale
    Watch,
}
