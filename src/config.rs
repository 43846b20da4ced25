// ==========================================
// CONFIGURATION
// ==========================================
// Settings for the player, loaded once at startup.
//
// Where settings come from (later wins):
// 1. Built-in defaults (see Default impl below)
// 2. <config dir>/tubequeue/config.json, if the file exists
// 3. Environment overrides (TUBEQUEUE_API_BASE_URL)
//
// Every field has a default, so a config file only needs the keys
// the user actually wants to change:
// ```
// { "api_base_url": "http://192.168.1.20:5000", "initial_volume": 0.6 }
// ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PlayerError, Result};

const APP_DIR: &str = "tubequeue";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "tubequeue.log";
const API_BASE_URL_ENV: &str = "TUBEQUEUE_API_BASE_URL";

// The download service refuses files above 200 MB, we refuse the same.
const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 200 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub search_path: String,
    pub download_path: String,
    pub request_timeout_secs: u64,
    pub max_payload_bytes: u64,
    pub initial_volume: f32,
    pub seek_step_secs: f64,
    pub volume_step: f32,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            search_path: "/search".to_string(),
            download_path: "/download-video".to_string(),
            request_timeout_secs: 120,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            initial_volume: 1.0,
            seek_step_secs: 10.0,
            volume_step: 0.1,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    // ==========================================
    // LOADING: load()
    // ==========================================
    // Reads config.json from the user's config directory.
    //
    // Missing file (or no config directory at all, e.g. a bare
    // container) is not an error: we just run on defaults.
    // A file that exists but doesn't parse IS an error, because
    // silently ignoring a typo'd config is worse than refusing to start.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_dir() {
            Some(dir) => Self::load_from(&dir.join(CONFIG_FILE))?,
            None => Config::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            PlayerError::Config(format!("{}: {}", path.display(), e))
        })
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    pub fn validate(&mut self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(PlayerError::Config("api_base_url is empty".to_string()));
        }
        if self.max_payload_bytes == 0 {
            return Err(PlayerError::Config(
                "max_payload_bytes must be greater than zero".to_string(),
            ));
        }

        if !(self.seek_step_secs.is_finite() && self.seek_step_secs > 0.0) {
            return Err(PlayerError::Config(format!(
                "seek_step_secs must be a positive number, got {}",
                self.seek_step_secs
            )));
        }
        if !(self.volume_step.is_finite() && self.volume_step > 0.0) {
            return Err(PlayerError::Config(format!(
                "volume_step must be a positive number, got {}",
                self.volume_step
            )));
        }

        // Out-of-range volume isn't worth refusing to start over
        self.initial_volume = if self.initial_volume.is_finite() {
            self.initial_volume.clamp(0.0, 1.0)
        } else {
            1.0
        };

        Ok(())
    }

    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    // Log file goes next to config.json unless the user picked a path
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| Self::config_dir().map(|d| d.join(LOG_FILE)))
    }

    pub fn search_url(&self) -> String {
        join_url(&self.api_base_url, &self.search_path)
    }

    pub fn download_url(&self) -> String {
        join_url(&self.api_base_url, &self.download_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
