use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::exif::LayoutOptions;

/// Top-level configuration for geotag-exif.
///
/// Controls the EXIF byte layout, the time zone used when no timestamp is
/// given, and output behavior (dry run, backups, file naming).
///
/// # Loading
///
/// ```rust,no_run
/// use geotag_exif::config::Config;
/// use geotag_exif::exif::DateStampEncoding;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.layout.date_stamp = DateStampEncoding::LegacyInline;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// EXIF layout choices (GPSDateStamp encoding, entry order).
    #[serde(default)]
    pub layout: LayoutOptions,
    /// Local time zone for generated timestamps.
    #[serde(default)]
    pub time: TimeConfig,
    /// Output behavior (dry run, backups, file naming).
    #[serde(default)]
    pub output: OutputConfig,
}

/// Wall-clock settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Offset from UTC in minutes, e.g. 420 for UTC+07:00.
    pub utc_offset_minutes: i32,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// If `true`, report what would be written without modifying any files.
    pub dry_run: bool,
    /// If `true`, create a `.bak` backup before modifying an image.
    pub backup_originals: bool,
    /// Prefix for delivered file names (`<prefix>YYYYMMDD_HHMMSS.jpg`).
    pub file_prefix: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: 7 * 60 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup_originals: true,
            file_prefix: "TSE1_".to_string(),
        }
    }
}

impl TimeConfig {
    /// The configured offset as a chrono `FixedOffset`.
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).with_context(|| {
            format!("UTC offset of {} minutes is out of range", self.utc_offset_minutes)
        })
    }

    /// Current time in the configured offset.
    pub fn now(&self) -> Result<DateTime<FixedOffset>> {
        Ok(Utc::now().with_timezone(&self.offset()?))
    }
}

impl OutputConfig {
    /// File name for a geotagged image produced at `timestamp`.
    pub fn file_name(&self, timestamp: &DateTime<FixedOffset>) -> String {
        format!("{}{}.jpg", self.file_prefix, timestamp.format("%Y%m%d_%H%M%S"))
    }
}

impl Config {
    /// Resolve the config file path (same directory as the executable).
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
