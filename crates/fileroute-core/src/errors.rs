//! Error hierarchy for fileroute.
//!
//! - [`ConfigurationError`]: a resource cannot be made usable (fatal at init)
//! - [`RoutingError`]: a write or publish was refused by the filesystem rules
//! - [`TemplateError`]: a pattern or condition could not be evaluated
//! - [`FileRouteError`]: top-level error carrying the resource name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for fileroute operations.
pub type Result<T> = std::result::Result<T, FileRouteError>;

/// Invalid resource configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Resources must be addressable by a non-empty name.
    #[error("resource name must not be empty")]
    EmptyResourceName,

    /// A required pattern option was absent or empty.
    #[error("resource '{resource}': missing '{option}' configuration parameter")]
    MissingPattern {
        /// Resource name.
        resource: String,
        /// Option name as it appears in configuration.
        option: &'static str,
    },

    /// A pattern could not be compiled.
    #[error("resource '{resource}': invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Resource name.
        resource: String,
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// `highWaterMark` must be `-1` or a non-negative count.
    #[error("resource '{resource}': invalid highWaterMark {value}; expected -1 or >= 0")]
    InvalidHighWaterMark {
        /// Resource name.
        resource: String,
        /// The rejected value.
        value: i64,
    },

    /// `highWaterMarkPollFrequency` must be non-zero.
    #[error("resource '{resource}': highWaterMarkPollFrequency must be greater than zero")]
    InvalidPollFrequency {
        /// Resource name.
        resource: String,
    },

    /// Two resources share a name.
    #[error("duplicate resource name '{name}'")]
    DuplicateResource {
        /// The repeated name.
        name: String,
    },
}

/// A routing rule refused the operation.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The destination exists but is a file.
    #[error(
        "target directory '{}' exists but is not a directory (destinationDirectoryPattern: '{pattern}')",
        .path.display()
    )]
    NotADirectory {
        /// Rendered destination path.
        path: PathBuf,
        /// Pattern it was rendered from.
        pattern: String,
    },

    /// The destination directory could not be created.
    #[error(
        "failed to create target directory '{}' (destinationDirectoryPattern: '{pattern}'): {source}",
        .path.display()
    )]
    DirectoryCreation {
        /// Rendered destination path.
        path: PathBuf,
        /// Pattern it was rendered from.
        pattern: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The directory stayed at or above the high water mark for the whole timeout.
    #[error(
        "timed out ({timeout:?}) waiting for the number of '{pattern}' files in '{}' to drop below the high water mark ({high_water_mark})",
        .directory.display()
    )]
    AdmissionTimeout {
        /// Directory being counted.
        directory: PathBuf,
        /// File name pattern being counted.
        pattern: String,
        /// Configured ceiling.
        high_water_mark: usize,
        /// Configured timeout.
        timeout: Duration,
    },

    /// The final name is already taken; the staging file is left in place.
    #[error(
        "could not rename '{}' to '{}': target already exists",
        .staging.display(),
        .target.display()
    )]
    AlreadyExists {
        /// Staging file that was not published.
        staging: PathBuf,
        /// Existing file at the final name.
        target: PathBuf,
    },

    /// The rename itself failed.
    #[error("could not rename '{}' to '{}': {source}", .staging.display(), .target.display())]
    RenameFailed {
        /// Staging file.
        staging: PathBuf,
        /// Intended final path.
        target: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The final name could not be rendered when the stream was closed.
    #[error("staging file '{}' left unpublished: {source}", .staging.display())]
    UnnamedStaging {
        /// Staging file that was not published.
        staging: PathBuf,
        /// Why the file name pattern did not render.
        #[source]
        source: TemplateError,
    },

    /// No resource is registered under the requested name.
    #[error("no output resource named '{name}' is configured")]
    UnknownResource {
        /// Requested name.
        name: String,
    },
}

/// Pattern rendering or condition evaluation failure.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// `${` without a closing `}`.
    #[error("unterminated placeholder at offset {offset} in '{pattern}'")]
    Unterminated {
        /// The pattern.
        pattern: String,
        /// Byte offset of the `${`.
        offset: usize,
    },

    /// The model has no value for a placeholder.
    #[error("no value for '${{{key}}}' in model while rendering '{pattern}'")]
    MissingValue {
        /// The pattern.
        pattern: String,
        /// Placeholder expression.
        key: String,
    },

    /// A name pattern could not be turned into a matcher.
    #[error("cannot build a file name matcher for '{pattern}': {reason}")]
    InvalidMatcher {
        /// The pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A condition expression could not be parsed.
    #[error("malformed condition '{expression}': {reason}")]
    MalformedCondition {
        /// The expression.
        expression: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum FileRouteError {
    /// Configuration is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A routing rule refused the operation.
    #[error("resource '{resource}': {source}")]
    Routing {
        /// Resource name.
        resource: String,
        /// The refusal.
        #[source]
        source: RoutingError,
    },

    /// A pattern or condition failed to evaluate.
    #[error("resource '{resource}': {source}")]
    Template {
        /// Resource name.
        resource: String,
        /// The failure.
        #[source]
        source: TemplateError,
    },

    /// A lower-level stream failure.
    #[error("resource '{resource}': I/O error while {operation} '{}': {source}", .path.display())]
    Io {
        /// Resource name.
        resource: String,
        /// What was being done.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

impl FileRouteError {
    /// Wrap a routing refusal with the resource name.
    #[must_use]
    pub fn routing(resource: impl Into<String>, source: RoutingError) -> Self {
        Self::Routing {
            resource: resource.into(),
            source,
        }
    }

    /// Wrap a template failure with the resource name.
    #[must_use]
    pub fn template(resource: impl Into<String>, source: TemplateError) -> Self {
        Self::Template {
            resource: resource.into(),
            source,
        }
    }

    /// Wrap an I/O failure with resource and file context.
    #[must_use]
    pub fn io(
        resource: impl Into<String>,
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            resource: resource.into(),
            operation,
            path: path.into(),
            source,
        }
    }

    /// The routing refusal, if this is one.
    #[must_use]
    pub fn as_routing(&self) -> Option<&RoutingError> {
        match self {
            Self::Routing { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Resource the error belongs to, when known.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Routing { resource, .. }
            | Self::Template { resource, .. }
            | Self::Io { resource, .. } => Some(resource),
            Self::Configuration(
                ConfigurationError::MissingPattern { resource, .. }
                | ConfigurationError::InvalidPattern { resource, .. }
                | ConfigurationError::InvalidHighWaterMark { resource, .. }
                | ConfigurationError::InvalidPollFrequency { resource },
            ) => Some(resource),
            Self::Configuration(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
