use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::entry::SortOrder;
use crate::domain::timestamp::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::error::ConfigError;
use crate::remote::client::DEFAULT_BASE_URL;
use crate::run::Delays;
use crate::summarize::openai;

const APP_DIR: &str = "inbox_harvest";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub output_dir: String,
    pub window_days: i64,
    pub sort: SortOrder,
    pub page_delay_ms: u64,
    pub item_delay_ms: u64,
    pub llm: LlmSection,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub language: String,
    pub max_input_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: "inbox_exports".to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            sort: SortOrder::NewestFirst,
            page_delay_ms: 2000,
            item_delay_ms: 1000,
            llm: LlmSection::default(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: openai::DEFAULT_BASE_URL.to_string(),
            model: openai::DEFAULT_MODEL.to_string(),
            language: "English".to_string(),
            max_input_chars: 12_000,
        }
    }
}

impl Config {
    pub fn delays(&self) -> Delays {
        Delays {
            page: Duration::from_millis(self.page_delay_ms),
            item: Duration::from_millis(self.item_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_window_days(self.window_days)?;
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Window sizes must be in `1..=MAX_WINDOW_DAYS`.
pub fn check_window_days(days: i64) -> Result<(), ConfigError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(ConfigError::InvalidValue {
            key: "window_days".to_string(),
            message: format!("must be between 1 and {MAX_WINDOW_DAYS}, got {days}"),
        });
    }
    Ok(())
}

fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| ConfigError::Parse("no config dir available".to_string()))?
        .join(APP_DIR))
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

/// Load the user config, writing a template with defaults on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        let sample = Config::default();
        let tom = toml::to_string_pretty(&sample).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, tom)?;
        log::info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "window_days = 3\noutput_dir = \"digests\"\n\n[llm]\nlanguage = \"German\"\n",
        )
        .unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.window_days, 3);
        assert_eq!(cfg.output_dir, "digests");
        assert_eq!(cfg.llm.language, "German");
        assert_eq!(cfg.llm.model, openai::DEFAULT_MODEL);
        assert_eq!(cfg.sort, SortOrder::NewestFirst);
        assert_eq!(cfg.delays().page, Duration::from_secs(2));
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "window_days = 0\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
        fs::write(&path, "window_days = 100000000000\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
        fs::write(&path, "window_days = \"seven\"\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn window_days_bounds() {
        assert!(check_window_days(1).is_ok());
        assert!(check_window_days(MAX_WINDOW_DAYS).is_ok());
        assert!(check_window_days(0).is_err());
        assert!(check_window_days(MAX_WINDOW_DAYS + 1).is_err());
    }

    #[test]
    fn sort_order_parses_snake_case() {
        let cfg: Config = toml::from_str("sort = \"oldest_first\"\n").unwrap();
        assert_eq!(cfg.sort, SortOrder::OldestFirst);
    }
}
