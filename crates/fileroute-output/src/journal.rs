//! Append-only list of published files.
//!
//! When a resource has a `listFileNamePattern`, its first publish in a
//! session opens `<published dir>/<rendered list name>` for appending. Every
//! publish then appends the absolute published path plus the platform line
//! separator and flushes. The journal stays open for the rest of the session
//! and is closed once by [`close_all`] at teardown.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use fileroute_core::{FileRouteError, ResourceConfig, Result};
use fileroute_template::PathTemplateResolver;
use tracing::debug;

use crate::session::Session;

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// An open list file.
#[derive(Debug)]
pub struct JournalHandle {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JournalHandle {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Path of the list file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, entry: &Path) -> io::Result<()> {
        self.writer.write_all(entry.as_os_str().as_encoded_bytes())?;
        self.writer.write_all(LINE_SEPARATOR.as_bytes())?;
        self.writer.flush()
    }

    fn close(self) -> io::Result<()> {
        let file = self.writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()
    }
}

/// Record a published file in the resource's journal, opening it on first use.
///
/// No-op when the resource has no list pattern.
pub fn record(
    config: &ResourceConfig,
    resolver: &PathTemplateResolver,
    session: &mut Session,
    published: &Path,
) -> Result<()> {
    let resource = config.name();

    let (model, _, state) = session.resource_parts(resource);
    let (journal, opened) = match state.journal.take() {
        Some(journal) => (journal, None),
        None => {
            let Some(name) = resolver
                .list_file_name(config, model)
                .map_err(|e| FileRouteError::template(resource, e))?
            else {
                return Ok(());
            };
            let path = published
                .parent()
                .map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name));
            let journal = JournalHandle::open(path.clone())
                .map_err(|e| FileRouteError::io(resource, "opening list file", &path, e))?;
            debug!(resource, path = %path.display(), "opened list file");
            (journal, Some(path))
        }
    };

    let journal = state.journal.insert(journal);
    let appended = journal
        .append(published)
        .map_err(|e| FileRouteError::io(resource, "appending to list file", &journal.path, e));

    if let Some(path) = opened {
        session.register_list_file(path);
    }
    appended
}

/// Close every journal still open in `session`.
///
/// Close failures are logged and discarded.
pub fn close_all(session: &mut Session) {
    for (resource, state) in session.states_mut() {
        let Some(journal) = state.journal.take() else {
            continue;
        };
        let path = journal.path.clone();
        if let Err(error) = journal.close() {
            debug!(resource, path = %path.display(), %error, "failed to close list file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileroute_core::Model;

    fn config(list: Option<&str>) -> ResourceConfig {
        let builder = ResourceConfig::builder("orders")
            .file_name_pattern("item-${itemId}.xml")
            .destination_directory_pattern("out");
        let builder = match list {
            Some(pattern) => builder.list_file_name_pattern(pattern),
            None => builder,
        };
        builder.build().unwrap()
    }

    fn session() -> Session {
        Session::new([("orderId", "1")].into_iter().collect::<Model>())
    }

    #[test]
    fn disabled_without_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session();
        record(
            &config(None),
            &PathTemplateResolver::default(),
            &mut session,
            &tmp.path().join("item-1.xml"),
        )
        .unwrap();

        assert!(session.journal_path("orders").is_none());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn lines_are_flushed_as_written() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(Some("items-${orderId}.lst"));
        let resolver = PathTemplateResolver::default();
        let mut session = session();

        let first = tmp.path().join("item-1.xml");
        let second = tmp.path().join("item-2.xml");
        record(&config, &resolver, &mut session, &first).unwrap();
        record(&config, &resolver, &mut session, &second).unwrap();

        let list = tmp.path().join("items-1.lst");
        assert_eq!(session.journal_path("orders"), Some(list.as_path()));
        assert_eq!(session.list_files(), [list.clone()]);

        let content = std::fs::read_to_string(&list).unwrap();
        let expected = format!(
            "{}{LINE_SEPARATOR}{}{LINE_SEPARATOR}",
            first.display(),
            second.display()
        );
        assert_eq!(content, expected);
    }

    #[test]
    fn close_all_releases_journals() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(Some("items.lst"));
        let mut session = session();
        record(
            &config,
            &PathTemplateResolver::default(),
            &mut session,
            &tmp.path().join("item-1.xml"),
        )
        .unwrap();

        close_all(&mut session);
        assert!(session.journal_path("orders").is_none());
        // registry of produced list files survives teardown
        assert_eq!(session.list_files().len(), 1);

        close_all(&mut session);
    }

    #[test]
    fn missing_list_placeholder_value_is_a_template_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = record(
            &config(Some("items-${customer}.lst")),
            &PathTemplateResolver::default(),
            &mut session(),
            &tmp.path().join("item-1.xml"),
        )
        .unwrap_err();
        assert!(matches!(err, FileRouteError::Template { .. }));
    }

    #[test]
    fn list_file_lands_under_the_rendered_name() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session();
        let _ = session.model_mut().insert("batch", "b7");
        record(
            &config(Some("${batch}-${orderId}.lst")),
            &PathTemplateResolver::default(),
            &mut session,
            &tmp.path().join("item-1.xml"),
        )
        .unwrap();

        let list = tmp.path().join("b7-1.lst");
        assert_eq!(session.list_files(), [list.clone()]);
        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries, [list]);
    }
}
