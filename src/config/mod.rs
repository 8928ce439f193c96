use std::{
    env,
    path::{Path, PathBuf},
};

use chrono_tz::Tz;
use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::ledger::{
    Calendar, LedgerMutator, RecurrenceEngine, DEFAULT_MAX_BACKFILL, DEFAULT_PLAN_LIMIT,
};
use crate::utils::persistence::{read_json, write_json_atomic};

const DEFAULT_DIR_NAME: &str = ".household_core";
const CONFIG_FILE: &str = "config.json";
const HOME_ENV: &str = "HOUSEHOLD_CORE_HOME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monthly cap per transaction kind for unpaid households.
    pub plan_limit: i64,
    /// IANA zone used to find local month and day boundaries.
    pub timezone: String,
    pub max_backfill: usize,
    pub default_currency: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plan_limit: DEFAULT_PLAN_LIMIT,
            timezone: "UTC".into(),
            max_backfill: DEFAULT_MAX_BACKFILL,
            default_currency: "EUR".into(),
            log_filter: "household_core=info".into(),
        }
    }
}

impl Config {
    pub fn time_zone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| LedgerError::Config(format!("timezone `{}`: {}", self.timezone, err)))
    }

    pub fn calendar(&self) -> Result<Calendar> {
        Ok(Calendar::new(self.time_zone()?))
    }

    pub fn mutator(&self) -> Result<LedgerMutator> {
        if self.plan_limit < 0 {
            return Err(LedgerError::Config("plan_limit must not be negative".into()));
        }
        Ok(LedgerMutator::new(self.calendar()?, self.plan_limit))
    }

    pub fn recurrence_engine(&self) -> Result<RecurrenceEngine> {
        Ok(RecurrenceEngine::new(self.mutator()?, self.max_backfill))
    }
}

/// Returns the application data directory, defaulting to `~/.household_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Loads and saves [`Config`] as pretty JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        Self {
            path: base.join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file yields the defaults.
    pub fn load(&self) -> Result<Config> {
        match read_json::<Config>(&self.path)? {
            Some(config) => {
                config.time_zone()?;
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.time_zone()?;
        write_json_atomic(&self.path, config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
