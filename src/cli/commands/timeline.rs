use crate::cli::commands::{open_store, print_json, resolve_location};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::timeline::TimelineReconstructor;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::header;
use crate::utils::colors::{color_for_level, colorize};
use crate::utils::formatting::bar;
use crate::utils::time::{local_hhmm, minutes};

const BAR_WIDTH: usize = 40;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Timeline { loc, bucket, json } = cmd else {
        return Ok(());
    };

    let location = resolve_location(loc.as_ref(), cfg)?;
    let width = match bucket {
        Some(m) if *m <= 0 => {
            return Err(AppError::Validation(format!(
                "bucket width must be a positive number of minutes, got {}",
                m
            )));
        }
        Some(m) => minutes(*m)?,
        None => cfg.bucket_width()?,
    };

    let store = open_store(cfg)?;
    let view = TimelineReconstructor::new(width)
        .today(&store, location)
        .await?;

    if *json {
        return print_json(&view);
    }

    header(format!("{} · today", location));
    println!("Now present: {}\n", view.current_occupancy);

    if view.timeline.events.is_empty() {
        println!("No check-ins or check-outs today.");
    }

    for sample in &view.buckets {
        let level = sample.level;
        println!(
            "{}  {:>3}  {}",
            local_hhmm(&sample.bucket_start),
            level,
            colorize(&bar(level, BAR_WIDTH), color_for_level(level))
        );
    }

    Ok(())
}
