use crate::cli::commands::{open_store, print_json};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::presence::load_presence;
use crate::errors::AppResult;
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::formatting::mins2readable;
use crate::utils::time::{elapsed_minutes, local_datetime};
use chrono::Utc;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Status { json } = cmd else {
        return Ok(());
    };

    let store = open_store(cfg)?;
    let presence = load_presence(&store).await?;

    if *json {
        return print_json(&presence);
    }

    println!("👤 User    : {}", presence.user_id);

    let Some(checked_in_at) = presence.checked_in_at() else {
        println!("📍 Status  : {}{}{}", GREY, presence.status().as_str(), RESET);
        if let Some(since) = presence.since {
            println!("🕒 Since   : {}", local_datetime(&since));
        }
        return Ok(());
    };

    println!("📍 Status  : {}{}{}", GREEN, presence.status().as_str(), RESET);
    if let Some(loc) = presence.location {
        println!("🏢 Location: {}", loc);
    }

    let elapsed = elapsed_minutes(&checked_in_at, &Utc::now());
    println!(
        "🕒 Since   : {} ({} ago)",
        local_datetime(&checked_in_at),
        mins2readable(elapsed, false)
    );

    if elapsed >= cfg.stale_threshold()?.num_minutes() {
        println!(
            "\n⚠️  Still checked in after {}. Forgot to check out? Run `rpresence correct --minutes <N>`.",
            mins2readable(elapsed, false)
        );
    }

    Ok(())
}
