//! Settings types.
//!
//! Keys are camelCase on disk and match the resource option names. Durations
//! are in milliseconds.

use std::collections::HashSet;
use std::time::Duration;

use fileroute_core::{
    ConfigurationError, DEFAULT_HIGH_WATER_MARK, DEFAULT_HIGH_WATER_MARK_POLL_FREQUENCY,
    DEFAULT_HIGH_WATER_MARK_TIMEOUT, ResourceConfig,
};
use serde::{Deserialize, Serialize};

/// Top-level settings for a router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterSettings {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Values applied to every resource entry that leaves them out.
    pub defaults: ResourceDefaults,
    /// Configured resources.
    pub resources: Vec<ResourceSettings>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            defaults: ResourceDefaults::default(),
            resources: Vec::new(),
        }
    }
}

impl RouterSettings {
    /// Validate every resource entry into a [`ResourceConfig`].
    pub fn resource_configs(&self) -> Result<Vec<ResourceConfig>, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut configs = Vec::with_capacity(self.resources.len());
        for entry in &self.resources {
            let config = entry.to_config(&self.defaults)?;
            if !seen.insert(config.name().to_owned()) {
                return Err(ConfigurationError::DuplicateResource {
                    name: config.name().to_owned(),
                });
            }
            configs.push(config);
        }
        Ok(configs)
    }
}

/// Shared resource defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceDefaults {
    /// Write straight into the final file.
    pub append: bool,
    /// File-count ceiling; `-1` disables admission control.
    pub high_water_mark: i64,
    /// Longest admission wait, in milliseconds.
    pub high_water_mark_timeout: u64,
    /// Admission re-check interval, in milliseconds.
    pub high_water_mark_poll_frequency: u64,
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            append: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            high_water_mark_timeout: millis(DEFAULT_HIGH_WATER_MARK_TIMEOUT),
            high_water_mark_poll_frequency: millis(DEFAULT_HIGH_WATER_MARK_POLL_FREQUENCY),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// One resource entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSettings {
    /// Name callers address the resource by.
    #[serde(default)]
    pub resource_name: String,
    /// Template for the published file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name_pattern: Option<String>,
    /// Template for the destination directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_directory_pattern: Option<String>,
    /// Template for the list journal name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_file_name_pattern: Option<String>,
    /// Overrides [`ResourceDefaults::append`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
    /// Overrides [`ResourceDefaults::high_water_mark`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_water_mark: Option<i64>,
    /// Overrides [`ResourceDefaults::high_water_mark_timeout`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_water_mark_timeout: Option<u64>,
    /// Overrides [`ResourceDefaults::high_water_mark_poll_frequency`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_water_mark_poll_frequency: Option<u64>,
    /// Expression that must hold before a close publishes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_on_condition: Option<String>,
}

impl ResourceSettings {
    /// Build the validated configuration, filling gaps from `defaults`.
    pub fn to_config(
        &self,
        defaults: &ResourceDefaults,
    ) -> Result<ResourceConfig, ConfigurationError> {
        let mut builder = ResourceConfig::builder(self.resource_name.clone())
            .append(self.append.unwrap_or(defaults.append))
            .high_water_mark(self.high_water_mark.unwrap_or(defaults.high_water_mark))
            .high_water_mark_timeout(Duration::from_millis(
                self.high_water_mark_timeout
                    .unwrap_or(defaults.high_water_mark_timeout),
            ))
            .high_water_mark_poll_frequency(Duration::from_millis(
                self.high_water_mark_poll_frequency
                    .unwrap_or(defaults.high_water_mark_poll_frequency),
            ));

        if let Some(pattern) = &self.file_name_pattern {
            builder = builder.file_name_pattern(pattern.clone());
        }
        if let Some(pattern) = &self.destination_directory_pattern {
            builder = builder.destination_directory_pattern(pattern.clone());
        }
        if let Some(pattern) = &self.list_file_name_pattern {
            builder = builder.list_file_name_pattern(pattern.clone());
        }
        if let Some(expression) = &self.close_on_condition {
            builder = builder.close_on_condition(expression.clone());
        }
        builder.build()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
