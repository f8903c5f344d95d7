use serde::{Deserialize, Serialize};
use thiserror::Error;

/*----- */
// Time matching mode
/*----- */
// Which pair of timestamps the matcher compares: the venues' own event
// times, or the local receive times (default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeMatchingMode {
    OriginalTimestamp,
    #[default]
    ReceiveTime,
}

/*----- */
// Engine config
/*----- */
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    pub max_time_diff_ms: u64,
    pub data_expiration_ms: u64,
    pub cleanup_interval_ms: u64,
    pub max_queue_size: usize,
    pub history_retention_count: usize,
    pub time_matching_mode: TimeMatchingMode,
    pub max_local_time_diff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_time_diff_ms: 1000,
            data_expiration_ms: 1000,
            cleanup_interval_ms: 5000,
            max_queue_size: 100,
            history_retention_count: 2000,
            time_matching_mode: TimeMatchingMode::ReceiveTime,
            max_local_time_diff_ms: 500,
        }
    }
}

/*----- */
// Partial update
/*----- */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigUpdate {
    pub max_time_diff_ms: Option<u64>,
    pub data_expiration_ms: Option<u64>,
    pub cleanup_interval_ms: Option<u64>,
    pub max_queue_size: Option<usize>,
    pub history_retention_count: Option<usize>,
    pub time_matching_mode: Option<TimeMatchingMode>,
    pub max_local_time_diff_ms: Option<u64>,
}

/*----- */
// Field specs
/*----- */
// One table drives range validation and the /config/schema endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigFieldSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: u64,
    pub max: u64,
    pub default: u64,
    pub description: &'static str,
}

pub const CONFIG_FIELD_SPECS: [ConfigFieldSpec; 6] = [
    ConfigFieldSpec {
        name: "max_time_diff_ms",
        unit: "ms",
        min: 500,
        max: 5000,
        default: 1000,
        description: "Largest timestamp difference at which two quotes still pair",
    },
    ConfigFieldSpec {
        name: "data_expiration_ms",
        unit: "ms",
        min: 100,
        max: 5000,
        default: 1000,
        description: "Age past which a buffered quote is evicted",
    },
    ConfigFieldSpec {
        name: "cleanup_interval_ms",
        unit: "ms",
        min: 100,
        max: 10000,
        default: 5000,
        description: "Period of the per-instrument expiry sweeper",
    },
    ConfigFieldSpec {
        name: "max_queue_size",
        unit: "entries",
        min: 10,
        max: 1000,
        default: 100,
        description: "Per-exchange quote buffer capacity",
    },
    ConfigFieldSpec {
        name: "history_retention_count",
        unit: "entries",
        min: 100,
        max: 10000,
        default: 2000,
        description: "Matched-pair history entries kept per instrument",
    },
    ConfigFieldSpec {
        name: "max_local_time_diff_ms",
        unit: "ms",
        min: 100,
        max: 2000,
        default: 500,
        description: "Largest lag between a venue timestamp and the local clock",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigFieldSpec>,
    pub time_matching_modes: [&'static str; 2],
}

pub fn config_schema() -> ConfigSchema {
    ConfigSchema {
        fields: CONFIG_FIELD_SPECS.to_vec(),
        time_matching_modes: ["originalTimestamp", "receiveTime"],
    }
}

/*----- */
// Violations
/*----- */
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field} must be between {min} and {max}, got {value}")]
pub struct ConfigViolation {
    pub field: &'static str,
    pub value: u64,
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config update rejected with {} violation(s)", .0.len())]
pub struct ConfigRejected(pub Vec<ConfigViolation>);

/*----- */
// Config store
/*----- */
// The live parameter set shared by every instrument. Mutations bump the
// version so observers can tell a fresh read from a pinned copy.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: EngineConfig,
    version: u64,
}

// What a mutation produced: the full new config plus whether the sweeper
// period moved, which forces timer recreation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChanged {
    pub config: EngineConfig,
    pub version: u64,
    pub cleanup_interval_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedConfig {
    pub version: u64,
    pub config: EngineConfig,
}

impl ConfigStore {
    pub fn current(&self) -> &EngineConfig {
        &self.current
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> VersionedConfig {
        VersionedConfig {
            version: self.version,
            config: self.current.clone(),
        }
    }

    pub fn validate(update: &ConfigUpdate) -> Vec<ConfigViolation> {
        let present = [
            ("max_time_diff_ms", update.max_time_diff_ms),
            ("data_expiration_ms", update.data_expiration_ms),
            ("cleanup_interval_ms", update.cleanup_interval_ms),
            ("max_queue_size", update.max_queue_size.map(|v| v as u64)),
            (
                "history_retention_count",
                update.history_retention_count.map(|v| v as u64),
            ),
            ("max_local_time_diff_ms", update.max_local_time_diff_ms),
        ];

        let mut violations = Vec::new();

        for (field, value) in present {
            if let Some(value) = value {
                if let Some(spec) = CONFIG_FIELD_SPECS.iter().find(|spec| spec.name == field) {
                    if value < spec.min || value > spec.max {
                        violations.push(ConfigViolation {
                            field,
                            value,
                            min: spec.min,
                            max: spec.max,
                        });
                    }
                }
            }
        }

        violations
    }

    // Merge without validation. Range enforcement is the caller's choice
    // via safe_update; this path exists for trusted embedders.
    pub fn update(&mut self, update: ConfigUpdate) -> ConfigChanged {
        let old_cleanup_interval = self.current.cleanup_interval_ms;

        if let Some(max_time_diff_ms) = update.max_time_diff_ms {
            self.current.max_time_diff_ms = max_time_diff_ms;
        }
        if let Some(data_expiration_ms) = update.data_expiration_ms {
            self.current.data_expiration_ms = data_expiration_ms;
        }
        if let Some(cleanup_interval_ms) = update.cleanup_interval_ms {
            self.current.cleanup_interval_ms = cleanup_interval_ms;
        }
        if let Some(max_queue_size) = update.max_queue_size {
            self.current.max_queue_size = max_queue_size;
        }
        if let Some(history_retention_count) = update.history_retention_count {
            self.current.history_retention_count = history_retention_count;
        }
        if let Some(time_matching_mode) = update.time_matching_mode {
            self.current.time_matching_mode = time_matching_mode;
        }
        if let Some(max_local_time_diff_ms) = update.max_local_time_diff_ms {
            self.current.max_local_time_diff_ms = max_local_time_diff_ms;
        }

        self.version += 1;

        ConfigChanged {
            config: self.current.clone(),
            version: self.version,
            cleanup_interval_changed: self.current.cleanup_interval_ms != old_cleanup_interval,
        }
    }

    // All-or-nothing: a single out-of-range field rejects the whole update
    // and leaves the store untouched.
    pub fn safe_update(&mut self, update: ConfigUpdate) -> Result<ConfigChanged, ConfigRejected> {
        let violations = Self::validate(&update);
        if !violations.is_empty() {
            return Err(ConfigRejected(violations));
        }

        Ok(self.update(update))
    }

    pub fn reset(&mut self) -> ConfigChanged {
        let old_cleanup_interval = self.current.cleanup_interval_ms;
        self.current = EngineConfig::default();
        self.version += 1;

        ConfigChanged {
            config: self.current.clone(),
            version: self.version,
            cleanup_interval_changed: self.current.cleanup_interval_ms != old_cleanup_interval,
        }
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_match_field_specs() {
        let config = EngineConfig::default();
        assert_eq!(config.max_time_diff_ms, 1000);
        assert_eq!(config.data_expiration_ms, 1000);
        assert_eq!(config.cleanup_interval_ms, 5000);
        assert_eq!(config.max_queue_size, 100);
        assert_eq!(config.history_retention_count, 2000);
        assert_eq!(config.time_matching_mode, TimeMatchingMode::ReceiveTime);
        assert_eq!(config.max_local_time_diff_ms, 500);

        for spec in CONFIG_FIELD_SPECS {
            assert!(spec.min <= spec.default && spec.default <= spec.max);
        }
    }

    #[test]
    fn test_update_merges_and_bumps_version() {
        let mut store = ConfigStore::default();
        assert_eq!(store.version(), 0);

        let changed = store.update(ConfigUpdate {
            max_time_diff_ms: Some(2000),
            ..ConfigUpdate::default()
        });

        assert_eq!(changed.version, 1);
        assert_eq!(changed.config.max_time_diff_ms, 2000);
        assert!(!changed.cleanup_interval_changed);
        // Untouched fields keep their previous values
        assert_eq!(store.current().data_expiration_ms, 1000);
    }

    #[test]
    fn test_update_reports_cleanup_interval_change() {
        let mut store = ConfigStore::default();

        let changed = store.update(ConfigUpdate {
            cleanup_interval_ms: Some(1000),
            ..ConfigUpdate::default()
        });
        assert!(changed.cleanup_interval_changed);

        // Same value again is not a change
        let changed = store.update(ConfigUpdate {
            cleanup_interval_ms: Some(1000),
            ..ConfigUpdate::default()
        });
        assert!(!changed.cleanup_interval_changed);
    }

    #[test]
    fn test_validate_collects_all_violations() {
        let violations = ConfigStore::validate(&ConfigUpdate {
            max_queue_size: Some(5),
            max_time_diff_ms: Some(10_000),
            data_expiration_ms: Some(200),
            ..ConfigUpdate::default()
        });

        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.field == "max_queue_size"));
        assert!(violations.iter().any(|v| v.field == "max_time_diff_ms"));
    }

    #[test]
    fn test_safe_update_rejects_whole_update() {
        let mut store = ConfigStore::default();

        let result = store.safe_update(ConfigUpdate {
            max_queue_size: Some(5),
            max_time_diff_ms: Some(2000),
            ..ConfigUpdate::default()
        });

        assert!(result.is_err());
        // Nothing applied, not even the in-range field
        assert_eq!(store.current().max_time_diff_ms, 1000);
        assert_eq!(store.current().max_queue_size, 100);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_safe_update_applies_valid_update() {
        let mut store = ConfigStore::default();

        let changed = store
            .safe_update(ConfigUpdate {
                max_queue_size: Some(50),
                time_matching_mode: Some(TimeMatchingMode::OriginalTimestamp),
                ..ConfigUpdate::default()
            })
            .unwrap();

        assert_eq!(changed.config.max_queue_size, 50);
        assert_eq!(
            store.current().time_matching_mode,
            TimeMatchingMode::OriginalTimestamp
        );
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut store = ConfigStore::default();
        store.update(ConfigUpdate {
            cleanup_interval_ms: Some(1000),
            max_queue_size: Some(500),
            ..ConfigUpdate::default()
        });

        let changed = store.reset();

        assert_eq!(changed.config, EngineConfig::default());
        assert!(changed.cleanup_interval_changed);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_time_matching_mode_serde_names() {
        let mode: TimeMatchingMode = serde_json::from_str("\"originalTimestamp\"").unwrap();
        assert_eq!(mode, TimeMatchingMode::OriginalTimestamp);

        let mode: TimeMatchingMode = serde_json::from_str("\"receiveTime\"").unwrap();
        assert_eq!(mode, TimeMatchingMode::ReceiveTime);
    }
}
