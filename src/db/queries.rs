use crate::errors::{AppError, AppResult};
use crate::models::action::Action;
use crate::models::event::{EventSource, OccupancyEvent, format_timestamp, parse_timestamp};
use crate::models::location::Location;
use crate::store::EventQuery;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, ToSql, params};

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(err))
}

pub fn map_row(row: &Row) -> Result<OccupancyEvent> {
    let loc_str: String = row.get("location")?;
    let location = Location::from_db_str(&loc_str)
        .ok_or_else(|| conversion_error(2, AppError::InvalidLocation(loc_str.clone())))?;

    let action_str: String = row.get("action")?;
    let action = Action::from_db_str(&action_str).ok_or_else(|| {
        conversion_error(3, AppError::Other(format!("Invalid action: {}", action_str)))
    })?;

    let ts_str: String = row.get("occurred_at")?;
    let occurred_at =
        parse_timestamp(&ts_str).ok_or_else(|| conversion_error(4, AppError::InvalidDate(ts_str)))?;

    let source_str: String = row.get("source")?;
    let source = EventSource::from_db_str(&source_str).ok_or_else(|| {
        conversion_error(5, AppError::Other(format!("Invalid source: {}", source_str)))
    })?;

    Ok(OccupancyEvent {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        location,
        action,
        occurred_at,
        source,
        duration_minutes: row.get("duration_minutes")?,
    })
}

/// Append an event and return it with its assigned id.
pub fn insert_event(conn: &Connection, ev: &OccupancyEvent) -> AppResult<OccupancyEvent> {
    conn.execute(
        "INSERT INTO events (user_id, location, action, occurred_at, source, duration_minutes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ev.user_id,
            ev.location.to_db_str(),
            ev.action.to_db_str(),
            ev.occurred_at_str(),
            ev.source.to_db_str(),
            ev.duration_minutes,
            format_timestamp(&Utc::now()),
        ],
    )?;

    Ok(ev.clone().with_id(conn.last_insert_rowid()))
}

/// Chronologically last event of a user, at any location.
pub fn last_event_for_user(conn: &Connection, user_id: &str) -> AppResult<Option<OccupancyEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM events
         WHERE user_id = ?1
         ORDER BY occurred_at DESC, id DESC
         LIMIT 1",
    )?;

    Ok(stmt.query_row([user_id], map_row).optional()?)
}

/// Events matching the query, most recent first.
pub fn load_events(conn: &Connection, query: &EventQuery) -> AppResult<Vec<OccupancyEvent>> {
    let mut sql = String::from("SELECT * FROM events WHERE 1 = 1");
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(user) = &query.user_id {
        args.push(Box::new(user.clone()));
        sql.push_str(&format!(" AND user_id = ?{}", args.len()));
    }
    if let Some(loc) = query.location {
        args.push(Box::new(loc.to_db_str()));
        sql.push_str(&format!(" AND location = ?{}", args.len()));
    }
    if let Some(since) = query.since {
        args.push(Box::new(format_timestamp(&since)));
        sql.push_str(&format!(" AND occurred_at >= ?{}", args.len()));
    }
    sql.push_str(" ORDER BY occurred_at DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
        map_row,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Number of users whose latest event at `location` is a check-in.
pub fn current_occupancy(conn: &Connection, location: Location) -> AppResult<u32> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM events e
         WHERE e.location = ?1
           AND e.action = 'in'
           AND e.id = (
               SELECT x.id FROM events x
               WHERE x.user_id = e.user_id AND x.location = ?1
               ORDER BY x.occurred_at DESC, x.id DESC
               LIMIT 1
           )",
        [location.to_db_str()],
        |row| row.get(0),
    )?;

    u32::try_from(count).map_err(|_| AppError::Other(format!("occupancy out of range: {count}")))
}

/// Latest event of every user whose latest event is a check-in, oldest first.
pub fn open_sessions(conn: &Connection) -> AppResult<Vec<OccupancyEvent>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM events e
         WHERE e.action = 'in'
           AND e.id = (
               SELECT x.id FROM events x
               WHERE x.user_id = e.user_id
               ORDER BY x.occurred_at DESC, x.id DESC
               LIMIT 1
           )
         ORDER BY e.occurred_at ASC",
    )?;
    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn count_events(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?)
}
