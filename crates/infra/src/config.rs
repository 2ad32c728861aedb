//! Configuration loading and representation.

use anyhow::Context;

use forgetrack_observability::LogFormat;
use forgetrack_workflow::{StatusLabel, validate_statuses};

pub const LOG_FORMAT_VAR: &str = "FORGETRACK_LOG_FORMAT";
pub const DEFAULT_STATUSES_VAR: &str = "FORGETRACK_DEFAULT_STATUSES";
pub const AUDIT_SNAPSHOTS_VAR: &str = "FORGETRACK_AUDIT_SNAPSHOTS";

/// Runtime settings of the tracker core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub log_format: LogFormat,
    /// Statuses used when a default workflow is created without an explicit
    /// list.
    pub default_statuses: Vec<StatusLabel>,
    /// Attach entity snapshots to audit records.
    pub audit_snapshots: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            default_statuses: ["TODO", "IN_PROGRESS", "DONE"]
                .into_iter()
                .filter_map(|s| StatusLabel::parse(s).ok())
                .collect(),
            audit_snapshots: true,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            config.log_format = raw
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }

        if let Some(raw) = lookup(DEFAULT_STATUSES_VAR) {
            let labels: Vec<&str> = raw.split(',').map(str::trim).collect();
            config.default_statuses = validate_statuses(labels.as_slice())
                .with_context(|| format!("invalid {DEFAULT_STATUSES_VAR}"))?;
        }

        if let Some(raw) = lookup(AUDIT_SNAPSHOTS_VAR) {
            config.audit_snapshots = parse_bool(&raw)
                .with_context(|| format!("invalid {AUDIT_SNAPSHOTS_VAR}"))?;
        }

        Ok(config)
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
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
        let config = TrackerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.default_statuses.len(), 3);
    }

    #[test]
    fn reads_overrides() {
        let config = TrackerConfig::from_lookup(lookup(&[
            (LOG_FORMAT_VAR, "pretty"),
            (DEFAULT_STATUSES_VAR, "OPEN, CLOSED"),
            (AUDIT_SNAPSHOTS_VAR, "off"),
        ]))
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.default_statuses[1].as_str(), "CLOSED");
        assert!(!config.audit_snapshots);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(TrackerConfig::from_lookup(lookup(&[(DEFAULT_STATUSES_VAR, "OPEN,OPEN")])).is_err());
        assert!(TrackerConfig::from_lookup(lookup(&[(AUDIT_SNAPSHOTS_VAR, "maybe")])).is_err());
        assert!(TrackerConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")])).is_err());
    }
}
