//! Staging files and the writable stream handed to callers.
//!
//! Staging files live directly in the destination directory and are named
//! `.<uuid><random>.working`. The leading dot and fixed suffix keep them
//! apart from anything a name pattern produces, so admission counting
//! never sees them.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Suffix of every staging file.
pub const STAGING_SUFFIX: &str = ".working";

/// Whether `name` follows the staging-file convention.
pub fn is_staging_file_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(STAGING_SUFFIX) && name.len() > 1 + STAGING_SUFFIX.len()
}

/// Where a stream's bytes end up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// Written to a staging file, renamed on publish.
    Staged,
    /// Appended in place to the final file.
    Append,
}

/// Record of the staging file backing an open stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingHandle {
    path: PathBuf,
}

impl StagingHandle {
    /// Absolute path of the staging file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Buffered writer over a staging or append target.
#[derive(Debug)]
pub struct OutputStream {
    writer: BufWriter<File>,
    path: PathBuf,
    mode: StreamMode,
}

impl OutputStream {
    /// File the bytes are going to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staged or append.
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Flush and close, returning the file path.
    pub(crate) fn finish(self) -> io::Result<PathBuf> {
        let file = self.writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        drop(file);
        Ok(self.path)
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Allocate a uniquely named staging file inside `directory`.
///
/// The file outlives the returned stream: it is removed only by renaming it
/// on publish.
pub fn create_staging_file(directory: &Path) -> io::Result<(OutputStream, StagingHandle)> {
    let prefix = format!(".{}", Uuid::new_v4());
    let (file, path) = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(directory)?
        .keep()?;

    let stream = OutputStream {
        writer: BufWriter::new(file),
        path: path.clone(),
        mode: StreamMode::Staged,
    };
    Ok((stream, StagingHandle { path }))
}

/// Open `path` for appending, creating it if absent.
pub fn open_append(path: &Path) -> io::Result<OutputStream> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(OutputStream {
        writer: BufWriter::new(file),
        path: path.to_path_buf(),
        mode: StreamMode::Append,
    })
}
