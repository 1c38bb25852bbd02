//! Renders the concrete names a resource writes to.

use std::path::PathBuf;
use std::sync::Arc;

use fileroute_core::{Model, ResourceConfig, TemplateError};

use crate::engine::{DollarBraceEngine, TemplateEngine};

/// Renders destination directory, file, and list-file names of a resource.
///
/// Stateless apart from the shared engine; cheap to clone.
#[derive(Clone)]
pub struct PathTemplateResolver {
    engine: Arc<dyn TemplateEngine>,
}

impl PathTemplateResolver {
    /// Resolve with the given engine.
    pub fn new(engine: Arc<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    /// Rendered `destinationDirectoryPattern`.
    pub fn destination_directory(
        &self,
        config: &ResourceConfig,
        model: &Model,
    ) -> Result<PathBuf, TemplateError> {
        self.engine
            .render(config.destination_directory_pattern(), model)
            .map(PathBuf::from)
    }

    /// Rendered `fileNamePattern`.
    pub fn file_name(&self, config: &ResourceConfig, model: &Model) -> Result<String, TemplateError> {
        self.engine.render(config.file_name_pattern(), model)
    }

    /// Rendered `listFileNamePattern`, or `None` when journaling is disabled.
    pub fn list_file_name(
        &self,
        config: &ResourceConfig,
        model: &Model,
    ) -> Result<Option<String>, TemplateError> {
        config
            .list_file_name_pattern()
            .map(|pattern| self.engine.render(pattern, model))
            .transpose()
    }
}

impl Default for PathTemplateResolver {
    fn default() -> Self {
        Self::new(Arc::new(DollarBraceEngine))
    }
}

impl std::fmt::Debug for PathTemplateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathTemplateResolver").finish_non_exhaustive()
    }
}
