use crate::db::pool::DbPool;
use crate::models::location::Location;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_kb = (file_size as f64) / 1024.0;

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.1} KB", CYAN, RESET, file_kb);

    //
    // 2) TOTAL EVENTS / USERS / CORRECTIONS
    //
    let (events, users, corrections): (i64, i64, i64) = pool.conn.query_row(
        "SELECT COUNT(*),
                COUNT(DISTINCT user_id),
                COALESCE(SUM(CASE WHEN source = 'correction' THEN 1 ELSE 0 END), 0)
         FROM events",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    println!("{}• Total events:{} {}{}{}", CYAN, RESET, GREEN, events, RESET);
    println!("{}• Distinct users:{} {}", CYAN, RESET, users);
    println!("{}• Corrections:{} {}", CYAN, RESET, corrections);

    //
    // 3) TIME RANGE
    //
    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT occurred_at FROM events ORDER BY occurred_at ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT occurred_at FROM events ORDER BY occurred_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    println!("{}• Time range:{}", CYAN, RESET);
    println!(
        "    from: {}",
        first.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );
    println!(
        "    to:   {}",
        last.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );

    //
    // 4) EVENTS PER LOCATION
    //
    println!("{}• Events per location:{}", CYAN, RESET);
    for loc in Location::ALL {
        let n: i64 = pool.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE location = ?1",
            [loc.to_db_str()],
            |row| row.get(0),
        )?;
        println!("    {:<14} {}", loc.name(), n);
    }

    println!();
    Ok(())
}
