//! High water mark admission control.
//!
//! Before a new output file is opened, the destination directory is listed
//! and entries matching the resource's name pattern are counted. While the
//! count is at or above the ceiling the caller is held in a polling loop:
//! sleep `poll_interval`, re-count, until the count drops (admitted) or
//! `timeout` elapses (error).
//!
//! The check is not atomic with the file creation that follows it, so
//! concurrent callers can transiently exceed the ceiling.
//!
//! A wait can be cancelled through a [`CancelHandle`]. Cancellation returns
//! [`Admission::Cancelled`] without an error and without admission having
//! been confirmed; callers proceed as if admitted.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fileroute_core::{FileRouteError, HighWaterMark, ResourceConfig, Result, RoutingError};
use fileroute_template::NamePatternMatcher;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::staging::is_staging_file_name;

/// Outcome of an admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Admission control is disabled.
    Unlimited,
    /// The count was below the ceiling.
    Admitted,
    /// The wait was cancelled before the count dropped.
    Cancelled,
}

/// Cancels an admission wait in progress.
///
/// Behaves like a thread interrupt: a cancel with no wait in progress is
/// remembered and consumed by the next wait.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelHandle {
    /// Create an untriggered handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wake the current (or next) wait.
    pub fn cancel(&self) {
        *self.inner.cancelled.lock() = true;
        let _ = self.inner.wake.notify_all();
    }

    /// Whether a cancel is pending.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Sleep for up to `duration`. Returns `true` (and clears the flag) if
    /// cancelled.
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            if self.inner.wake.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }
        std::mem::take(&mut *cancelled)
    }
}

/// Admission settings of one resource.
#[derive(Clone, Debug)]
pub struct AdmissionController {
    high_water_mark: HighWaterMark,
    timeout: Duration,
    poll_interval: Duration,
}

impl AdmissionController {
    /// Controller with explicit settings.
    pub fn new(high_water_mark: HighWaterMark, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            high_water_mark,
            timeout,
            poll_interval,
        }
    }

    /// Controller using a resource's configured settings.
    pub fn from_config(config: &ResourceConfig) -> Self {
        Self::new(
            config.high_water_mark(),
            config.high_water_mark_timeout(),
            config.high_water_mark_poll_frequency(),
        )
    }

    /// Block until `directory` holds fewer matching files than the ceiling.
    pub fn admit(
        &self,
        resource: &str,
        directory: &Path,
        matcher: &NamePatternMatcher,
        cancel: &CancelHandle,
    ) -> Result<Admission> {
        let HighWaterMark::Limit(limit) = self.high_water_mark else {
            return Ok(Admission::Unlimited);
        };

        let count = count_matching(resource, directory, matcher)?;
        if count < limit {
            return Ok(Admission::Admitted);
        }

        debug!(
            resource,
            directory = %directory.display(),
            count,
            high_water_mark = limit,
            pattern = matcher.pattern(),
            "destination at high water mark, waiting for file count to drop"
        );

        let start = Instant::now();
        while start.elapsed() < self.timeout {
            if cancel.sleep(self.poll_interval) {
                warn!(
                    resource,
                    directory = %directory.display(),
                    "admission wait cancelled before file count dropped"
                );
                return Ok(Admission::Cancelled);
            }
            if count_matching(resource, directory, matcher)? < limit {
                return Ok(Admission::Admitted);
            }
        }

        Err(FileRouteError::routing(
            resource,
            RoutingError::AdmissionTimeout {
                directory: directory.to_path_buf(),
                pattern: matcher.pattern().to_owned(),
                high_water_mark: limit,
                timeout: self.timeout,
            },
        ))
    }
}

/// Count regular files in `directory` the matcher recognizes.
///
/// Staging files are never counted.
pub fn count_matching(
    resource: &str,
    directory: &Path,
    matcher: &NamePatternMatcher,
) -> Result<usize> {
    let list_err = |source| FileRouteError::io(resource, "listing", directory, source);

    let mut count = 0;
    for entry in std::fs::read_dir(directory).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_staging_file_name(name) || !matcher.matches(name) {
            continue;
        }
        if entry.file_type().map_err(list_err)?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
