//! Destination directory provisioning safe under concurrent callers.
//!
//! The check-then-create sequence runs under a per-path lock, so among callers
//! sharing one [`DirectoryProvisioner`] exactly one observes
//! [`Provisioned::Created`] and the rest see [`Provisioned::Existing`].
//! Share the provisioner (via `Arc`) between every resource that may target
//! the same physical directory. A path's lock entry lives only while some
//! caller is inside `ensure` for it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use fileroute_core::RoutingError;
use parking_lot::Mutex;
use tracing::debug;

/// What [`DirectoryProvisioner::ensure`] found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// The directory was already there.
    Existing,
    /// This call created it.
    Created,
}

/// Creates destination directories on demand.
#[derive(Debug, Default)]
pub struct DirectoryProvisioner {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DirectoryProvisioner {
    /// Create a provisioner with no lock entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `path` is a directory, creating it and its parents if absent.
    ///
    /// `pattern` is the destination pattern `path` was rendered from; it is
    /// only used in error messages.
    pub fn ensure(&self, path: &Path, pattern: &str) -> Result<Provisioned, RoutingError> {
        if existing_directory(path, pattern)? {
            return Ok(Provisioned::Existing);
        }

        let lock = self.lock_for(path);
        let outcome = {
            let _guard = lock.lock();
            create_if_missing(path, pattern)
        };
        self.release(path);
        outcome
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Drop the lock entry for `path` once no other caller holds it.
    ///
    /// Called with the caller's own clone still alive, so the map plus that
    /// clone account for two references.
    fn release(&self, path: &Path) {
        let _ = self
            .locks
            .remove_if(path, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

fn create_if_missing(path: &Path, pattern: &str) -> Result<Provisioned, RoutingError> {
    if existing_directory(path, pattern)? {
        return Ok(Provisioned::Existing);
    }

    match std::fs::create_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "created target directory");
            Ok(Provisioned::Created)
        }
        // another process won the race
        Err(_) if path.is_dir() => Ok(Provisioned::Existing),
        Err(source) => Err(RoutingError::DirectoryCreation {
            path: path.to_path_buf(),
            pattern: pattern.to_owned(),
            source,
        }),
    }
}

/// `Ok(true)` for a directory, `Ok(false)` when nothing usable is there yet.
fn existing_directory(path: &Path, pattern: &str) -> Result<bool, RoutingError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(true),
        Ok(_) => Err(RoutingError::NotADirectory {
            path: path.to_path_buf(),
            pattern: pattern.to_owned(),
        }),
        // not found, or unreadable: create_dir_all reports real failures
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Barrier;

    #[test]
    fn creates_missing_directory_with_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        let provisioner = DirectoryProvisioner::new();

        assert_eq!(provisioner.ensure(&target, "a/b").unwrap(), Provisioned::Created);
        assert!(target.is_dir());
        assert_eq!(provisioner.ensure(&target, "a/b").unwrap(), Provisioned::Existing);
    }

    #[test]
    fn rejects_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out");
        std::fs::write(&target, b"not a dir").unwrap();

        let err = DirectoryProvisioner::new().ensure(&target, "out").unwrap_err();
        assert_matches!(err, RoutingError::NotADirectory { ref pattern, .. } if pattern == "out");
    }

    #[test]
    fn creation_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let target = blocker.join("child");

        let err = DirectoryProvisioner::new().ensure(&target, "file/child").unwrap_err();
        assert_matches!(err, RoutingError::DirectoryCreation { .. });
    }

    #[test]
    fn concurrent_first_provisioning_has_one_creator() {
        const THREADS: usize = 16;
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("shared").join("out");
        let provisioner = DirectoryProvisioner::new();
        let barrier = Barrier::new(THREADS);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        let _ = barrier.wait();
                        provisioner.ensure(&target, "shared/out")
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(Result::is_ok));
        let created = results
            .iter()
            .filter(|r| matches!(r, Ok(Provisioned::Created)))
            .count();
        assert_eq!(created, 1);
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
        assert!(provisioner.locks.is_empty());
    }

    #[test]
    fn lock_entries_do_not_accumulate() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = DirectoryProvisioner::new();

        for order in 0..500 {
            let target = tmp.path().join(format!("out-{order}"));
            assert_eq!(
                provisioner.ensure(&target, "out-${orderId}").unwrap(),
                Provisioned::Created
            );
        }
        assert!(provisioner.locks.is_empty());

        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let _ = provisioner.ensure(&blocker.join("child"), "file/child").unwrap_err();
        assert!(provisioner.locks.is_empty());
    }
}
