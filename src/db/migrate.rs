use rusqlite::{Connection, Error, OptionalExtension, Result};
use tracing::{debug, info};

const MIGRATION_CORRECTION_DURATION: &str = "20260302_0002_add_correction_duration";
const MIGRATION_USER_INDEX: &str = "20260310_0003_add_user_index";

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Check if the `events` table exists.
fn events_table_exists(conn: &Connection) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='events'")?;
    let exists: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

/// Check if the `events` table has the given column.
fn events_has_column(conn: &Connection, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare("PRAGMA table_info('events')")?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Create the `events` table with the modern schema.
fn create_events_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          TEXT NOT NULL,
            location         TEXT NOT NULL CHECK(location IN ('M','A','L','S')),
            action           TEXT NOT NULL CHECK(action IN ('in','out')),
            occurred_at      TEXT NOT NULL,
            source           TEXT NOT NULL DEFAULT 'scan' CHECK(source IN ('scan','correction')),
            duration_minutes INTEGER,
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_occurred ON events(occurred_at);
        CREATE INDEX IF NOT EXISTS idx_events_location_occurred ON events(location, occurred_at);
        CREATE INDEX IF NOT EXISTS idx_events_user_occurred ON events(user_id, occurred_at);
        "#,
    )?;
    Ok(())
}

/// Older databases predate manual corrections: add the explicit duration column.
fn migrate_add_correction_duration(conn: &Connection) -> Result<(), Error> {
    if migration_applied(conn, MIGRATION_CORRECTION_DURATION)? {
        return Ok(());
    }

    if !events_has_column(conn, "duration_minutes")? {
        conn.execute("ALTER TABLE events ADD COLUMN duration_minutes INTEGER;", [])
            .map_err(|e| {
                Error::SqliteFailure(
                    rusqlite::ffi::Error::new(1),
                    Some(format!("Failed to add 'duration_minutes' column: {}", e)),
                )
            })?;
        info!(
            version = MIGRATION_CORRECTION_DURATION,
            "added 'duration_minutes' to events table"
        );
    }

    mark_applied(
        conn,
        MIGRATION_CORRECTION_DURATION,
        "Added duration_minutes for correction records",
    )
}

fn migrate_add_user_index(conn: &Connection) -> Result<(), Error> {
    if migration_applied(conn, MIGRATION_USER_INDEX)? {
        return Ok(());
    }

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_events_user_occurred ON events(user_id, occurred_at);",
    )?;

    mark_applied(conn, MIGRATION_USER_INDEX, "Added user/time index on events")
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db() and by the SQLite store on open.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Create events table if missing
    if !events_table_exists(conn)? {
        create_events_table(conn)?;
        info!("created events table (modern schema)");
    }

    // 3) Versioned migrations, each recorded in `log`
    migrate_add_correction_duration(conn)?;
    migrate_add_user_index(conn)?;

    debug!("schema up to date");
    Ok(())
}
