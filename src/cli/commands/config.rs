use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::config::ConfigLogic;
use crate::errors::AppResult;

/// `config --print` shows the effective configuration, overrides included;
/// `config --edit` opens the file on disk.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Config {
        print_config,
        edit_config,
        editor,
    } = cmd
    else {
        return Ok(());
    };

    if *print_config {
        ConfigLogic::print(cfg)?;
    }
    if *edit_config {
        ConfigLogic::edit(&Config::config_file(), editor)?;
    }
    Ok(())
}
