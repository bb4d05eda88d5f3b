use crate::cli::commands::{open_store, print_json, resolve_location};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::occupancy::{CountSource, LiveOccupancyCounter};
use crate::errors::AppResult;
use crate::utils::table::Table;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Occupancy {
        loc,
        fallback,
        json,
    } = cmd
    else {
        return Ok(());
    };

    let store = open_store(cfg)?;
    let counter = LiveOccupancyCounter::new(&store).force_fallback(*fallback);

    let readings = match loc {
        Some(_) => vec![counter.current(resolve_location(loc.as_ref(), cfg)?).await?],
        None => counter.all().await?,
    };

    if *json {
        return print_json(&readings);
    }

    let mut table = Table::new(["Location", "Present", "Source"]);
    for r in &readings {
        table.add_row(vec![
            r.location.to_string(),
            r.count.to_string(),
            match r.source {
                CountSource::Aggregate => "live".to_string(),
                CountSource::Fallback => "log".to_string(),
            },
        ]);
    }
    print!("{}", table.render());

    Ok(())
}
