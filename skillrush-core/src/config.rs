//! Store configuration
//!
//! Loaded from a TOML file; a missing file yields the defaults.
//!
//! ```toml
//! data_dir = "/var/lib/skillrush"
//! db_file = "skillrush.db"
//! bcrypt_cost = 10
//! utc_offset_minutes = 330
//! ```

use crate::error::{Result, StoreError};
use chrono::{FixedOffset, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Cost used by the browser build (`bcrypt.genSaltSync(10)`).
pub const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the database file.
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`.
    pub db_file: String,
    /// bcrypt work factor (4..=31).
    pub bcrypt_cost: u32,
    /// Fixed UTC offset for calendar-day boundaries. `None` uses the
    /// system local zone.
    pub utc_offset_minutes: Option<i32>,
    /// Keep the database in memory only.
    #[serde(skip)]
    pub in_memory: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            db_file: "skillrush.db".to_string(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            utc_offset_minutes: None,
            in_memory: false,
        }
    }
}

impl StoreConfig {
    /// Ephemeral configuration, mostly for tests.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let config: StoreConfig = toml::from_str(&data)
            .map_err(|e| StoreError::Config(format!("Failed to parse {:?}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(StoreError::Config(format!(
                "bcrypt_cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }
        if self.db_file.trim().is_empty() {
            return Err(StoreError::Config("db_file cannot be empty".to_string()));
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if FixedOffset::east_opt(minutes * 60).is_none() {
                return Err(StoreError::Config(format!(
                    "utc_offset_minutes out of range: {}",
                    minutes
                )));
            }
        }
        Ok(())
    }

    /// Full path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn day_boundary(&self) -> DayBoundary {
        match self.utc_offset_minutes.and_then(|m| FixedOffset::east_opt(m * 60)) {
            Some(offset) => DayBoundary::Fixed(offset),
            None => DayBoundary::Local,
        }
    }
}

/// Which zone decides where one calendar day ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    Local,
    Fixed(FixedOffset),
}

impl DayBoundary {
    /// Calendar date of a Unix-millis timestamp.
    pub fn date_of(&self, millis: i64) -> Option<NaiveDate> {
        let utc = Utc.timestamp_millis_opt(millis).single()?;
        Some(match self {
            DayBoundary::Local => utc.with_timezone(&Local).date_naive(),
            DayBoundary::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = StoreConfig::load(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.bcrypt_cost, 10);
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        fs::write(&path, "bcrypt_cost = 4\nutc_offset_minutes = 330\n").unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.db_file, "skillrush.db");
        assert_eq!(
            config.day_boundary(),
            DayBoundary::Fixed(FixedOffset::east_opt(330 * 60).unwrap())
        );
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        let config = StoreConfig {
            data_dir: tmp.path().to_path_buf(),
            bcrypt_cost: 6,
            ..StoreConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(StoreConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_cost() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        fs::write(&path, "bcrypt_cost = 2\n").unwrap();
        assert!(matches!(StoreConfig::load(&path), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        fs::write(&path, "bcrypt_cost = \"ten\"\n").unwrap();
        assert!(matches!(StoreConfig::load(&path), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_fixed_boundary_splits_at_local_midnight() {
        // UTC+05:30: 18:29 UTC is 23:59 local, 18:31 UTC is 00:01 next day.
        let ist = DayBoundary::Fixed(FixedOffset::east_opt(330 * 60).unwrap());
        let before = Utc.with_ymd_and_hms(2024, 3, 1, 18, 29, 0).unwrap().timestamp_millis();
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 18, 31, 0).unwrap().timestamp_millis();
        assert_eq!(ist.date_of(before), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(ist.date_of(after), NaiveDate::from_ymd_opt(2024, 3, 2));
    }
}
