//! # fileroute-core
//!
//! Shared vocabulary for the fileroute crates:
//!
//! - **Model**: [`Model`], the key/value bean map that patterns and
//!   conditions are evaluated against
//! - **Resource configuration**: [`ResourceConfig`], immutable once built,
//!   plus [`HighWaterMark`] for admission ceilings
//! - **Errors**: [`FileRouteError`] hierarchy via `thiserror`
//! - **Logging**: `tracing` subscriber setup and log capture for tests

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod logging;
pub mod model;

pub use config::{
    DEFAULT_HIGH_WATER_MARK, DEFAULT_HIGH_WATER_MARK_POLL_FREQUENCY,
    DEFAULT_HIGH_WATER_MARK_TIMEOUT, HighWaterMark, ResourceConfig, ResourceConfigBuilder,
};
pub use errors::{ConfigurationError, FileRouteError, Result, RoutingError, TemplateError};
pub use model::Model;
