use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_location")]
    pub default_location: String,
    #[serde(default = "default_stale_threshold")]
    pub stale_threshold_minutes: i64,
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: i64,
    #[serde(default = "default_correction_min")]
    pub correction_min_minutes: i64,
    #[serde(default = "default_correction_max")]
    pub correction_max_minutes: i64,
    #[serde(default = "default_transition_timeout")]
    pub transition_timeout_secs: u64,
    #[serde(default = "default_scan_debounce")]
    pub scan_debounce_ms: u64,
    #[serde(default = "default_server_aggregate")]
    pub server_aggregate: bool,
}

fn default_user_id() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "local".to_string())
}
fn default_location() -> String {
    "M".to_string()
}
fn default_stale_threshold() -> i64 {
    120
}
fn default_bucket_minutes() -> i64 {
    30
}
fn default_correction_min() -> i64 {
    1
}
fn default_correction_max() -> i64 {
    600
}
fn default_transition_timeout() -> u64 {
    10
}
fn default_scan_debounce() -> u64 {
    1500
}
fn default_server_aggregate() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file())
    }
}

impl Config {
    fn with_database(db_path: PathBuf) -> Self {
        Self {
            database: db_path.to_string_lossy().to_string(),
            user_id: default_user_id(),
            default_location: default_location(),
            stale_threshold_minutes: default_stale_threshold(),
            bucket_minutes: default_bucket_minutes(),
            correction_min_minutes: default_correction_min(),
            correction_max_minutes: default_correction_max(),
            transition_timeout_secs: default_transition_timeout(),
            scan_debounce_ms: default_scan_debounce(),
            server_aggregate: default_server_aggregate(),
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rpresence")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rpresence")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rpresence.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rpresence.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Initialize configuration and database files.
    /// Returns the configuration that was written (or would have been, in test mode).
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();

        // DB path: user provided or default
        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(&name);
                // test mode keeps relative paths relative to the working dir
                if p.is_absolute() || is_test {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => dir.join("rpresence.sqlite"),
        };

        let config = Self::with_database(db_path.clone());

        // Write config file
        if !is_test {
            fs::create_dir_all(&dir)?;
            let yaml = config.to_yaml()?;
            let mut file = fs::File::create(Self::config_file()).map_err(|_| AppError::ConfigSave)?;
            file.write_all(yaml.as_bytes())
                .map_err(|_| AppError::ConfigSave)?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }

    // ---------------------------
    // Typed accessors
    // ---------------------------

    pub fn stale_threshold(&self) -> AppResult<chrono::Duration> {
        crate::utils::time::minutes(self.stale_threshold_minutes.max(1))
    }

    pub fn bucket_width(&self) -> AppResult<chrono::Duration> {
        crate::utils::time::minutes(self.bucket_minutes.max(1))
    }

    pub fn correction_bounds(&self) -> std::ops::RangeInclusive<i64> {
        self.correction_min_minutes..=self.correction_max_minutes
    }

    pub fn transition_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.transition_timeout_secs.max(1))
    }

    pub fn scan_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scan_debounce_ms)
    }
}
