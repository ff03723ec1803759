//! Engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use servicepro_finance::RevenueMonthMatch;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// JSON snapshot file. `None` keeps the workshop purely in memory.
    pub snapshot_path: Option<PathBuf>,

    /// Seed demo records when no snapshot exists yet.
    pub seed_demo_data: bool,

    /// How month revenue matches the current month.
    pub revenue_month_match: RevenueMonthMatch,

    /// Size of the recent-transactions view.
    pub recent_transactions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_path: Some(PathBuf::from("servicepro.json")),
            seed_demo_data: true,
            revenue_month_match: RevenueMonthMatch::YearAndMonth,
            recent_transactions: 30,
        }
    }
}

impl EngineConfig {
    /// In-memory configuration with no demo data; used by tests and embedders.
    pub fn in_memory() -> Self {
        Self {
            snapshot_path: None,
            seed_demo_data: false,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let snapshot_path = var("SERVICEPRO_SNAPSHOT_PATH", "servicepro.json");
        let config = EngineConfig {
            snapshot_path: match snapshot_path.trim() {
                "" => None,
                path => Some(PathBuf::from(path)),
            },

            seed_demo_data: var("SERVICEPRO_SEED_DEMO_DATA", "true")
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVICEPRO_SEED_DEMO_DATA".to_string()))?,

            revenue_month_match: var("SERVICEPRO_REVENUE_MONTH_MATCH", "year_and_month")
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("SERVICEPRO_REVENUE_MONTH_MATCH".to_string())
                })?,

            recent_transactions: var("SERVICEPRO_RECENT_TRANSACTIONS", "30")
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVICEPRO_RECENT_TRANSACTIONS".to_string()))?,
        };

        if config.recent_transactions == 0 {
            return Err(ConfigError::InvalidValue("SERVICEPRO_RECENT_TRANSACTIONS".to_string()));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("SERVICEPRO_SNAPSHOT_PATH", "/var/lib/servicepro/state.json"),
            ("SERVICEPRO_SEED_DEMO_DATA", "false"),
            ("SERVICEPRO_REVENUE_MONTH_MATCH", "month_only"),
            ("SERVICEPRO_RECENT_TRANSACTIONS", "50"),
        ]))
        .unwrap();
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/var/lib/servicepro/state.json")));
        assert!(!config.seed_demo_data);
        assert_eq!(config.revenue_month_match, RevenueMonthMatch::MonthOnly);
        assert_eq!(config.recent_transactions, 50);
    }

    #[test]
    fn blank_path_means_in_memory() {
        let config = EngineConfig::from_lookup(lookup(&[("SERVICEPRO_SNAPSHOT_PATH", " ")])).unwrap();
        assert_eq!(config.snapshot_path, None);
    }

    #[test]
    fn rejects_bad_values() {
        for (key, value) in [
            ("SERVICEPRO_SEED_DEMO_DATA", "maybe"),
            ("SERVICEPRO_REVENUE_MONTH_MATCH", "weekly"),
            ("SERVICEPRO_RECENT_TRANSACTIONS", "0"),
            ("SERVICEPRO_RECENT_TRANSACTIONS", "-3"),
        ] {
            let err = EngineConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            match err {
                ConfigError::InvalidValue(name) if name == key => {}
                other => panic!("unexpected error for {key}: {other:?}"),
            }
        }
    }
}
