//! Publishing a staging file under its final name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fileroute_core::RoutingError;
use tempfile::{PathPersistError, TempPath};

/// Move `staging` to `final_name` in the same directory.
///
/// Never replaces an existing file, even when another publish races for the
/// same name: the move itself refuses to overwrite. On any failure the
/// staging file is left where it is.
pub fn publish_staged(staging: &Path, final_name: &str) -> Result<PathBuf, RoutingError> {
    let target = match staging.parent() {
        Some(dir) => dir.join(final_name),
        None => PathBuf::from(final_name),
    };

    let already_exists = |target: PathBuf| RoutingError::AlreadyExists {
        staging: staging.to_path_buf(),
        target,
    };

    if std::fs::symlink_metadata(&target).is_ok() {
        return Err(already_exists(target));
    }

    match TempPath::from_path(staging).persist_noclobber(&target) {
        Ok(()) => Ok(target),
        Err(PathPersistError { error, path }) => {
            // keep the staging file on disk
            let _ = path.keep();
            if error.kind() == ErrorKind::AlreadyExists {
                Err(already_exists(target))
            } else {
                Err(RoutingError::RenameFailed {
                    staging: staging.to_path_buf(),
                    target,
                    source: error,
                })
            }
        }
    }
}
