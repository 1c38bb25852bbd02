//! # fileroute-settings
//!
//! Router settings loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`RouterSettings::default()`]
//! 2. **Settings file**: `$FILEROUTE_CONFIG` or `./fileroute.json`, deep-merged
//!    over the defaults
//! 3. **Environment variables**: `FILEROUTE_*` overrides (highest priority)
//!
//! [`RouterSettings::resource_configs`] turns the loaded entries into
//! validated resource configurations.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::{ResourceDefaults, ResourceSettings, RouterSettings};

/// Load settings from `path` and validate every resource entry.
pub fn load_resource_configs(
    path: &std::path::Path,
) -> Result<(RouterSettings, Vec<fileroute_core::ResourceConfig>)> {
    let settings = load_settings_from_path(path)?;
    let configs = settings.resource_configs()?;
    Ok((settings, configs))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
