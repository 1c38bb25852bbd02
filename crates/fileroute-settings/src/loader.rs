//! Reading `fileroute.json` and layering it over the compiled defaults.
//!
//! A settings file only needs the keys it changes: a missing file means
//! "all defaults", and `null` leaves a default in place. The `defaults`
//! block is merged key by key, but the `resources` list is taken as written,
//! so one file fully describes the configured resources. `FILEROUTE_*`
//! variables are read last and adjust the resource defaults only.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::Result;
use crate::types::RouterSettings;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "FILEROUTE_CONFIG";

/// Settings file used when none is given: `$FILEROUTE_CONFIG`, else
/// `fileroute.json` in the working directory.
pub fn settings_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("fileroute.json"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RouterSettings> {
    load_settings_from_path(&settings_path())
}

/// Settings from `path` layered over the defaults, then `FILEROUTE_*` overrides.
///
/// An absent file is not an error. A file that is unreadable or not valid
/// JSON is.
pub fn load_settings_from_path(path: &Path) -> Result<RouterSettings> {
    let mut layered = serde_json::to_value(RouterSettings::default())?;

    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "merging settings file over defaults");
            layered = deep_merge(layered, serde_json::from_str(&text)?);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
        }
        Err(e) => return Err(e.into()),
    }

    let mut settings: RouterSettings = serde_json::from_value(layered)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Overlay `overlay` onto `base`.
///
/// Two objects combine key by key, recursing into shared keys and ignoring
/// `null` overlay entries. Any other pairing yields `overlay` unchanged, which
/// is how a `resources` array replaces the default list.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_objects(base, overlay)),
        (_, overlay) => overlay,
    }
}

fn merge_objects(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay.into_iter().filter(|(_, v)| !v.is_null()) {
        let value = match base.remove(&key) {
            Some(existing) => deep_merge(existing, value),
            None => value,
        };
        let _ = base.insert(key, value);
    }
    base
}

/// Apply `FILEROUTE_*` environment overrides to loaded settings.
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut RouterSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`, which maps a variable name to its value.
pub fn apply_overrides(settings: &mut RouterSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = read_string(&lookup, "FILEROUTE_LOG_LEVEL") {
        settings.log_level = v;
    }

    // ── Resource defaults ───────────────────────────────────────────
    if let Some(v) = read_bool(&lookup, "FILEROUTE_APPEND") {
        settings.defaults.append = v;
    }
    if let Some(v) = read_i64(&lookup, "FILEROUTE_HIGH_WATER_MARK", -1, 1_000_000) {
        settings.defaults.high_water_mark = v;
    }
    if let Some(v) = read_u64(&lookup, "FILEROUTE_HIGH_WATER_MARK_TIMEOUT_MS", 0, 86_400_000) {
        settings.defaults.high_water_mark_timeout = v;
    }
    if let Some(v) = read_u64(&lookup, "FILEROUTE_HIGH_WATER_MARK_POLL_MS", 1, 3_600_000) {
        settings.defaults.high_water_mark_poll_frequency = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as an `i64` within a range.
pub fn parse_i64_range(val: &str, min: i64, max: i64) -> Option<i64> {
    let n: i64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Variable readers ────────────────────────────────────────────────────────

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn read_bool(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let val = lookup(name)?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_i64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: i64,
    max: i64,
) -> Option<i64> {
    let val = lookup(name)?;
    let result = parse_i64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid i64 env var, ignoring");
    }
    result
}

fn read_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: u64,
    max: u64,
) -> Option<u64> {
    let val = lookup(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
