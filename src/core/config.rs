use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    pub fn print(cfg: &Config) -> AppResult<()> {
        println!("📄 Current configuration:\n");
        println!("{}", cfg.to_yaml()?);
        Ok(())
    }

    fn default_editor() -> String {
        std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            })
    }

    fn run_editor(editor: &str, path: &Path) -> bool {
        matches!(Command::new(editor).arg(path).status(), Ok(s) if s.success())
    }

    /// Open `path` in the requested editor, falling back to $EDITOR / $VISUAL / nano.
    pub fn edit(path: &Path, editor: &Option<String>) -> AppResult<()> {
        let default_editor = Self::default_editor();
        let requested = editor.clone().unwrap_or_else(|| default_editor.clone());

        if Self::run_editor(&requested, path) {
            success(format!("Configuration file edited using '{}'", requested));
            return Ok(());
        }

        warning(format!(
            "Editor '{}' not available, falling back to '{}'",
            requested, default_editor
        ));

        if Self::run_editor(&default_editor, path) {
            success(format!(
                "Configuration file edited using fallback '{}'",
                default_editor
            ));
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "failed to edit {} with '{}'",
                path.display(),
                default_editor
            )))
        }
    }
}
