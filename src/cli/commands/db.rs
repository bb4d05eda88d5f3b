use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::{queries, stats};
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};
use crate::utils::formatting::mins2readable;
use crate::utils::time::elapsed_minutes;
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Db {
        migrate,
        check,
        vacuum,
        info,
    } = cmd
    else {
        return Ok(());
    };

    let mut pool = DbPool::new(&cfg.database)?;

    if *migrate {
        println!("{}▶ Running migrations…{}", CYAN, RESET);
        init_db(&pool.conn)?;
        println!("{}✔ Migration completed.{}\n", GREEN, RESET);
    }

    if *info {
        stats::print_db_info(&mut pool, &cfg.database)?;
    }

    if *check {
        check_integrity(&pool)?;
        check_open_sessions(&pool, cfg)?;
    }

    if *vacuum {
        println!("{}▶ Running VACUUM…{}", CYAN, RESET);
        pool.conn.execute_batch("VACUUM;")?;
        println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
    }

    Ok(())
}

fn check_integrity(pool: &DbPool) -> AppResult<()> {
    println!("{}▶ Running integrity check…{}", CYAN, RESET);

    let integrity: String = pool
        .conn
        .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

    if integrity == "ok" {
        println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
    } else {
        println!("{}✘ Integrity check failed:{} {}\n", RED, RESET, integrity);
    }
    Ok(())
}

/// Sessions still open past the stale threshold are missed check-outs.
fn check_open_sessions(pool: &DbPool, cfg: &Config) -> AppResult<()> {
    println!("{}▶ Looking for forgotten check-outs…{}", CYAN, RESET);

    let now = Utc::now();
    let threshold = cfg.stale_threshold()?.num_minutes();
    let open = queries::open_sessions(&pool.conn)?;
    let stale: Vec<_> = open
        .iter()
        .filter(|ev| elapsed_minutes(&ev.occurred_at, &now) >= threshold)
        .collect();

    for ev in &stale {
        println!(
            "  {}•{} {} at {} since {} ({})",
            YELLOW,
            RESET,
            ev.user_id,
            ev.location,
            ev.local_time_str(),
            mins2readable(elapsed_minutes(&ev.occurred_at, &now), false)
        );
    }

    println!(
        "{}✔ {} open session(s), {} past the stale threshold.{}\n",
        GREEN,
        open.len(),
        stale.len(),
        RESET
    );
    Ok(())
}
