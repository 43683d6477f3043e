use crate::check::DEFAULT_TOLERANCE_SECS;
use crate::oplog::DEFAULT_LOG_FILE_NAME;
use crate::planner::DEFAULT_COLLISION_LIMIT;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "DATE_RENAMER_CONFIG";

/// Persistent defaults. Command-line flags can only switch options on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub safe: bool,
    pub dry_run: bool,
    pub log: bool,
    pub verbose: bool,
    pub recursive: bool,
    pub use_exiftool: bool,
    pub collision_limit: u32,
    pub mismatch_tolerance_secs: i64,
    pub log_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            safe: false,
            dry_run: false,
            log: false,
            verbose: false,
            recursive: false,
            use_exiftool: true,
            collision_limit: DEFAULT_COLLISION_LIMIT,
            mismatch_tolerance_secs: DEFAULT_TOLERANCE_SECS,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        let config_path = PathBuf::from(path);
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        return Ok(AppPaths {
            config_dir,
            config_path,
        });
    }

    let proj = ProjectDirs::from("com", "date-renamer", "date-renamer")
        .context("Could not determine the OS config directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&app_paths()?.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Could not read config file: {}", path.display()))?;

    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let paths = app_paths()?;
    save_config_to(config, &paths.config_path)?;
    Ok(paths.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| {
            format!("Could not create config directory: {}", dir.display())
        })?;
    }
    let body = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("Could not write config file: {}", path.display()))?;
    Ok(())
}
