//! Per-unit-of-work state.
//!
//! A [`Session`] is owned by the surrounding pipeline and passed by reference
//! into every resource call. For each resource name it holds the open stream,
//! the staging handle (non-append streams only), and the journal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fileroute_core::Model;
use uuid::Uuid;

use crate::admission::CancelHandle;
use crate::journal::JournalHandle;
use crate::staging::{OutputStream, StagingHandle};

/// State of one resource within a session.
#[derive(Debug, Default)]
pub(crate) struct ResourceState {
    pub(crate) stream: Option<OutputStream>,
    pub(crate) staging: Option<StagingHandle>,
    pub(crate) journal: Option<JournalHandle>,
}

/// One unit of work flowing through the pipeline.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    model: Model,
    cancel: CancelHandle,
    resources: HashMap<String, ResourceState>,
    list_files: Vec<PathBuf>,
}

impl Session {
    /// Start a session over `model`.
    pub fn new(model: Model) -> Self {
        Self {
            id: Uuid::now_v7(),
            model,
            cancel: CancelHandle::new(),
            resources: HashMap::new(),
            list_files: Vec::new(),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Model for the pipeline to update between visits.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Handle another thread can use to cancel an admission wait.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether `resource` has an open stream.
    pub fn is_open(&self, resource: &str) -> bool {
        self.resources
            .get(resource)
            .is_some_and(|s| s.stream.is_some())
    }

    /// Staging file currently backing `resource`, if any.
    pub fn staging_path(&self, resource: &str) -> Option<&Path> {
        self.resources
            .get(resource)?
            .staging
            .as_ref()
            .map(StagingHandle::path)
    }

    /// Journal file `resource` is recording into, if one is open.
    pub fn journal_path(&self, resource: &str) -> Option<&Path> {
        self.resources
            .get(resource)?
            .journal
            .as_ref()
            .map(JournalHandle::path)
    }

    /// Every list file opened during this session, in opening order.
    pub fn list_files(&self) -> &[PathBuf] {
        &self.list_files
    }

    /// Model, cancel handle, and the mutable state of `resource`, borrowed together.
    pub(crate) fn resource_parts(
        &mut self,
        resource: &str,
    ) -> (&Model, &CancelHandle, &mut ResourceState) {
        let state = self.resources.entry(resource.to_owned()).or_default();
        (&self.model, &self.cancel, state)
    }

    pub(crate) fn register_list_file(&mut self, path: PathBuf) {
        self.list_files.push(path);
    }

    pub(crate) fn states_mut(&mut self) -> impl Iterator<Item = (&str, &mut ResourceState)> {
        self.resources
            .iter_mut()
            .map(|(name, state)| (name.as_str(), state))
    }
}
