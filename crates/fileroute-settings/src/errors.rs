//! Settings error types.

use fileroute_core::ConfigurationError;
use thiserror::Error;

/// Errors that can occur when loading or interpreting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse JSON in the settings file.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A resource entry could not be turned into a valid configuration.
    #[error("invalid resource settings: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
