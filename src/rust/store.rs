//! Versioned JSON file holding a run's statistics.
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "architecture": "vgg",
//!   "statistics": { "n_images": 40, "n_dogs_img": 30, ..., "pct_correct_notdogs": 100.0 }
//! }
//! ```
//!
//! Counts are written as integers and percentages as floats, in
//! [`Statistic`] declaration order.

use log::info;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::stats::{AggregateStats, StatKind, StatValue, Statistic};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed stats file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported stats schema version {found} (expected {expected})", expected = SCHEMA_VERSION)]
    UnsupportedVersion { found: u64 },
    #[error("Unknown statistic '{0}' in stats file")]
    UnknownStatistic(String),
    #[error("Statistic '{0}' has a value of the wrong type")]
    InvalidValue(Statistic),
}

/// What [`load_stats`] reads back.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredStats {
    pub architecture: String,
    pub stats: AggregateStats,
}

struct OrderedStats<'a>(&'a AggregateStats);

impl Serialize for OrderedStats<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (stat, value) in self.0.iter() {
            match value {
                StatValue::Count(n) => map.serialize_entry(stat.name(), &(n as u64))?,
                StatValue::Percentage(p) => map.serialize_entry(stat.name(), &p)?,
            }
        }
        map.end()
    }
}

#[derive(Serialize)]
struct StatsFileOut<'a> {
    schema_version: u32,
    architecture: &'a str,
    statistics: OrderedStats<'a>,
}

#[derive(Deserialize)]
struct StatsFileIn {
    architecture: String,
    statistics: BTreeMap<String, serde_json::Value>,
}

pub fn save_stats(path: impl AsRef<Path>, architecture: &str, stats: &AggregateStats) -> Result<(), StoreError> {
    let path = path.as_ref();
    let file = StatsFileOut {
        schema_version: SCHEMA_VERSION,
        architecture,
        statistics: OrderedStats(stats),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json + "\n").map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} statistics to {:?}", stats.len(), path);
    Ok(())
}

pub fn load_stats(path: impl AsRef<Path>) -> Result<StoredStats, StoreError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value: serde_json::Value = serde_json::from_str(&text)?;
    let version = value.get("schema_version").and_then(serde_json::Value::as_u64).unwrap_or(0);
    if version != SCHEMA_VERSION as u64 {
        return Err(StoreError::UnsupportedVersion { found: version });
    }

    let file: StatsFileIn = serde_json::from_value(value)?;
    let mut stats = AggregateStats::default();
    for (name, raw) in file.statistics {
        let stat: Statistic = name.parse().map_err(|_| StoreError::UnknownStatistic(name.clone()))?;
        let value = match stat.kind() {
            StatKind::Count => raw
                .as_u64()
                .map(|n| StatValue::Count(n as usize))
                .ok_or(StoreError::InvalidValue(stat))?,
            StatKind::Percentage => raw
                .as_f64()
                .map(StatValue::Percentage)
                .ok_or(StoreError::InvalidValue(stat))?,
        };
        stats.insert(stat, value);
    }

    Ok(StoredStats {
        architecture: file.architecture,
        stats,
    })
}
