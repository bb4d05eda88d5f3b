use crate::cli::commands::{open_store, resolve_location};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::store::{EventQuery, EventStore};
use crate::utils::colors::{color_for_action, colorize};
use crate::utils::date::{parse_date, start_of_local_date, start_of_local_day};
use crate::utils::formatting::mins2readable;
use crate::utils::table::Table;
use chrono::Utc;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Events {
        loc,
        all_users,
        since,
        today,
    } = cmd
    else {
        return Ok(());
    };

    let mut query = EventQuery::default();
    if loc.is_some() {
        query.location = Some(resolve_location(loc.as_ref(), cfg)?);
    }
    if !*all_users {
        query.user_id = Some(cfg.user_id.clone());
    }

    if *today {
        query.since = Some(start_of_local_day(Utc::now()));
    } else if let Some(s) = since {
        let date = parse_date(s).ok_or_else(|| AppError::InvalidDate(s.clone()))?;
        query.since = Some(
            start_of_local_date(date)
                .ok_or_else(|| AppError::InvalidDate(format!("{} has no local midnight", s)))?,
        );
    }

    let store = open_store(cfg)?;
    let mut events = store.query_events(&query).await?;
    events.sort_by(|a, b| b.chrono_cmp(a));

    if events.is_empty() {
        println!("⚠️  No events found.");
        return Ok(());
    }

    let mut table = Table::new(["ID", "When", "User", "Location", "Action", "Source"]);
    for ev in &events {
        let source = match ev.duration_minutes {
            Some(m) if ev.is_correction() => format!("correction ({})", mins2readable(m, true)),
            _ => ev.source.to_db_str().to_string(),
        };
        table.add_row(vec![
            ev.id.to_string(),
            ev.local_time_str(),
            ev.user_id.clone(),
            ev.location.code().to_string(),
            ev.action.as_str().to_string(),
            source,
        ]);
    }

    // colour after layout so escape codes do not skew the widths
    let rendered = table.render();
    let mut lines = rendered.lines();
    for line in lines.by_ref().take(2) {
        println!("{}", line);
    }
    for (line, ev) in lines.zip(&events) {
        let action = ev.action.as_str();
        println!(
            "{}",
            line.replacen(action, &colorize(action, color_for_action(ev.action)), 1)
        );
    }

    Ok(())
}
