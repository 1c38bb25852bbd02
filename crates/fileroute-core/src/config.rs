//! Immutable per-resource configuration.
//!
//! A [`ResourceConfig`] is built once through [`ResourceConfigBuilder`] and
//! never mutated afterwards. Building validates the required patterns and the
//! admission settings; pattern syntax is checked later, when the matcher and
//! templates are compiled.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Default admission ceiling.
pub const DEFAULT_HIGH_WATER_MARK: i64 = 200;

/// Default time to wait for the file count to drop.
pub const DEFAULT_HIGH_WATER_MARK_TIMEOUT: Duration = Duration::from_secs(60);

/// Default sleep between admission re-checks.
pub const DEFAULT_HIGH_WATER_MARK_POLL_FREQUENCY: Duration = Duration::from_secs(1);

/// Admission ceiling on matching files in a destination directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum HighWaterMark {
    /// `-1`: admission control disabled.
    Unlimited,
    /// Block while this many or more matching files exist.
    Limit(usize),
}

impl HighWaterMark {
    /// Interpret a raw configured value. `-1` disables, negatives below are invalid.
    #[must_use]
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Unlimited),
            v if v >= 0 => usize::try_from(v).ok().map(Self::Limit),
            _ => None,
        }
    }
}

impl TryFrom<i64> for HighWaterMark {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or_else(|| format!("invalid high water mark {value}"))
    }
}

impl From<HighWaterMark> for i64 {
    fn from(mark: HighWaterMark) -> Self {
        match mark {
            HighWaterMark::Unlimited => -1,
            HighWaterMark::Limit(n) => n as i64,
        }
    }
}

/// Configuration of one named output resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceConfig {
    name: String,
    file_name_pattern: String,
    destination_directory_pattern: String,
    list_file_name_pattern: Option<String>,
    append: bool,
    high_water_mark: HighWaterMark,
    high_water_mark_timeout: Duration,
    high_water_mark_poll_frequency: Duration,
    close_on_condition: Option<String>,
}

impl ResourceConfig {
    /// Start building a resource with the given name.
    pub fn builder(name: impl Into<String>) -> ResourceConfigBuilder {
        ResourceConfigBuilder::new(name)
    }

    /// Name callers use to address this resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template for the final (or, when appending, the only) file name.
    pub fn file_name_pattern(&self) -> &str {
        &self.file_name_pattern
    }

    /// Template for the destination directory.
    pub fn destination_directory_pattern(&self) -> &str {
        &self.destination_directory_pattern
    }

    /// Template for the journal file name, if journaling is enabled.
    pub fn list_file_name_pattern(&self) -> Option<&str> {
        self.list_file_name_pattern.as_deref()
    }

    /// Write in place, never stage or rename.
    pub fn append(&self) -> bool {
        self.append
    }

    /// Admission ceiling.
    pub fn high_water_mark(&self) -> HighWaterMark {
        self.high_water_mark
    }

    /// Longest admission wait before failing.
    pub fn high_water_mark_timeout(&self) -> Duration {
        self.high_water_mark_timeout
    }

    /// Sleep between admission re-checks.
    pub fn high_water_mark_poll_frequency(&self) -> Duration {
        self.high_water_mark_poll_frequency
    }

    /// Expression gating whether a close publishes.
    pub fn close_on_condition(&self) -> Option<&str> {
        self.close_on_condition.as_deref()
    }
}

/// Builder for [`ResourceConfig`].
#[derive(Clone, Debug)]
pub struct ResourceConfigBuilder {
    name: String,
    file_name_pattern: Option<String>,
    destination_directory_pattern: Option<String>,
    list_file_name_pattern: Option<String>,
    append: bool,
    high_water_mark: i64,
    high_water_mark_timeout: Duration,
    high_water_mark_poll_frequency: Duration,
    close_on_condition: Option<String>,
}

impl ResourceConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name_pattern: None,
            destination_directory_pattern: None,
            list_file_name_pattern: None,
            append: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            high_water_mark_timeout: DEFAULT_HIGH_WATER_MARK_TIMEOUT,
            high_water_mark_poll_frequency: DEFAULT_HIGH_WATER_MARK_POLL_FREQUENCY,
            close_on_condition: None,
        }
    }

    /// Set `fileNamePattern`.
    #[must_use]
    pub fn file_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_name_pattern = Some(pattern.into());
        self
    }

    /// Set `destinationDirectoryPattern`.
    #[must_use]
    pub fn destination_directory_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.destination_directory_pattern = Some(pattern.into());
        self
    }

    /// Set `listFileNamePattern`.
    #[must_use]
    pub fn list_file_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.list_file_name_pattern = Some(pattern.into());
        self
    }

    /// Set `append`.
    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Set `highWaterMark`; `-1` disables admission control.
    #[must_use]
    pub fn high_water_mark(mut self, mark: i64) -> Self {
        self.high_water_mark = mark;
        self
    }

    /// Set `highWaterMarkTimeout`.
    #[must_use]
    pub fn high_water_mark_timeout(mut self, timeout: Duration) -> Self {
        self.high_water_mark_timeout = timeout;
        self
    }

    /// Set `highWaterMarkPollFrequency`.
    #[must_use]
    pub fn high_water_mark_poll_frequency(mut self, frequency: Duration) -> Self {
        self.high_water_mark_poll_frequency = frequency;
        self
    }

    /// Set `closeOnCondition`.
    #[must_use]
    pub fn close_on_condition(mut self, expression: impl Into<String>) -> Self {
        self.close_on_condition = Some(expression.into());
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<ResourceConfig, ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyResourceName);
        }

        let file_name_pattern = required(&self.name, "fileNamePattern", self.file_name_pattern)?;
        let destination_directory_pattern = required(
            &self.name,
            "destinationDirectoryPattern",
            self.destination_directory_pattern,
        )?;

        let high_water_mark = HighWaterMark::from_raw(self.high_water_mark).ok_or_else(|| {
            ConfigurationError::InvalidHighWaterMark {
                resource: self.name.clone(),
                value: self.high_water_mark,
            }
        })?;

        if self.high_water_mark_poll_frequency.is_zero() {
            return Err(ConfigurationError::InvalidPollFrequency {
                resource: self.name,
            });
        }

        Ok(ResourceConfig {
            name: self.name,
            file_name_pattern,
            destination_directory_pattern,
            list_file_name_pattern: self.list_file_name_pattern.filter(|p| !p.is_empty()),
            append: self.append,
            high_water_mark,
            high_water_mark_timeout: self.high_water_mark_timeout,
            high_water_mark_poll_frequency: self.high_water_mark_poll_frequency,
            close_on_condition: self
                .close_on_condition
                .filter(|c| !c.trim().is_empty()),
        })
    }
}

fn required(
    resource: &str,
    option: &'static str,
    value: Option<String>,
) -> Result<String, ConfigurationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigurationError::MissingPattern {
            resource: resource.to_owned(),
            option,
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
