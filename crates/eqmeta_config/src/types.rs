//! Configuration types deserialized from `eqmeta.toml`.

use serde::Deserialize;

/// Log levels accepted by `[log] level`.
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// The top-level engine configuration parsed from `eqmeta.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    /// Recomputation settings.
    #[serde(default)]
    pub engine: EngineSection,
    /// Field-selection policy settings.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// The `[engine]` section.
#[derive(Debug, Default, Deserialize)]
pub struct EngineSection {
    /// When stale artifacts are recomputed.
    #[serde(default)]
    pub recompute: RecomputePolicy,
}

/// When an artifact invalidated by a change notification is recomputed.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecomputePolicy {
    /// Recompute during the notification, then propagate downstream (default).
    #[default]
    Eager,
    /// Mark stale during the notification; recompute on the next read.
    Lazy,
}

/// The `[selection]` section.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionConfig {
    /// Qualified names treated as collection-like in addition to the built-in set.
    #[serde(default)]
    pub collection_types: Vec<String>,
}

/// The `[log]` section.
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Default log level when the command line does not override it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
