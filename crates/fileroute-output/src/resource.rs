//! Managed file output resource.
//!
//! [`FileOutputResource::acquire`] renders and provisions the destination
//! directory, waits for admission, then opens either a staging file (normal
//! mode) or the final file for appending (append mode). The stream stays
//! cached in the session until a close.
//!
//! [`FileOutputResource::close`] evaluates the close condition; when it holds
//! the stream is closed and, outside append mode, the staging file is renamed
//! to its rendered final name and recorded in the list journal.

use std::path::PathBuf;
use std::sync::Arc;

use fileroute_core::{ConfigurationError, FileRouteError, ResourceConfig, Result, RoutingError};
use fileroute_template::{
    ConditionEvaluator, NamePatternMatcher, PathTemplateResolver, SimpleConditionEvaluator,
    TemplateEngine, tokenize,
};
use tracing::{debug, instrument};

use crate::admission::{Admission, AdmissionController, CancelHandle};
use crate::journal;
use crate::provision::DirectoryProvisioner;
use crate::publish::publish_staged;
use crate::session::Session;
use crate::staging::{self, OutputStream, StagingHandle, StreamMode};

/// Collaborators shared by every resource of a router.
#[derive(Clone)]
pub struct ResourceServices {
    resolver: PathTemplateResolver,
    conditions: Arc<dyn ConditionEvaluator>,
    provisioner: Arc<DirectoryProvisioner>,
}

impl ResourceServices {
    /// Replace the template engine.
    #[must_use]
    pub fn with_template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.resolver = PathTemplateResolver::new(engine);
        self
    }

    /// Replace the close-condition evaluator.
    #[must_use]
    pub fn with_condition_evaluator(mut self, conditions: Arc<dyn ConditionEvaluator>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Share an existing directory provisioner.
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: Arc<DirectoryProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// The shared directory provisioner.
    pub fn provisioner(&self) -> &Arc<DirectoryProvisioner> {
        &self.provisioner
    }
}

impl Default for ResourceServices {
    fn default() -> Self {
        Self {
            resolver: PathTemplateResolver::default(),
            conditions: Arc::new(SimpleConditionEvaluator),
            provisioner: Arc::new(DirectoryProvisioner::new()),
        }
    }
}

impl std::fmt::Debug for ResourceServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceServices")
            .field("provisioner", &self.provisioner)
            .finish_non_exhaustive()
    }
}

/// Result of closing a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The close condition was false; the stream stays open.
    Deferred,
    /// No staged stream was open, so there was nothing to publish.
    NotStaged,
    /// An append-mode stream was closed in place.
    Appended(PathBuf),
    /// A staging file was renamed to this path.
    Published(PathBuf),
}

struct Opened {
    stream: OutputStream,
    staging: Option<StagingHandle>,
}

/// A configured output resource.
#[derive(Debug)]
pub struct FileOutputResource {
    config: ResourceConfig,
    matcher: NamePatternMatcher,
    admission: AdmissionController,
    services: ResourceServices,
}

impl FileOutputResource {
    /// Compile the resource's patterns. Fails if any pattern is malformed.
    pub fn initialize(
        config: ResourceConfig,
        services: ResourceServices,
    ) -> std::result::Result<Self, ConfigurationError> {
        let invalid = |pattern: &str, reason: String| ConfigurationError::InvalidPattern {
            resource: config.name().to_owned(),
            pattern: pattern.to_owned(),
            reason,
        };

        let matcher = NamePatternMatcher::compile(config.file_name_pattern())
            .map_err(|e| invalid(config.file_name_pattern(), e.to_string()))?;
        let _ = tokenize(config.destination_directory_pattern())
            .map_err(|e| invalid(config.destination_directory_pattern(), e.to_string()))?;
        if let Some(pattern) = config.list_file_name_pattern() {
            let _ = tokenize(pattern).map_err(|e| invalid(pattern, e.to_string()))?;
        }

        Ok(Self {
            admission: AdmissionController::from_config(&config),
            config,
            matcher,
            services,
        })
    }

    /// Name callers address this resource by.
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// The resource's configuration.
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// The session's open stream for this resource, opening one if needed.
    #[instrument(skip_all, fields(resource = %self.config.name()))]
    pub fn acquire<'s>(&self, session: &'s mut Session) -> Result<&'s mut OutputStream> {
        let (model, cancel, state) = session.resource_parts(self.config.name());
        let stream = match state.stream.take() {
            Some(stream) => stream,
            None => {
                let opened = self.open(model, cancel)?;
                state.staging = opened.staging;
                opened.stream
            }
        };
        Ok(state.stream.insert(stream))
    }

    /// Close the stream if the close condition holds, publishing staged output.
    #[instrument(skip_all, fields(resource = %self.config.name()))]
    pub fn close(&self, session: &mut Session) -> Result<CloseOutcome> {
        if !self.close_condition_holds(session)? {
            return Ok(CloseOutcome::Deferred);
        }
        self.finish(session)
    }

    /// Close and publish regardless of the close condition.
    pub fn finish(&self, session: &mut Session) -> Result<CloseOutcome> {
        let name = self.config.name();
        let (model, _, state) = session.resource_parts(name);
        let staging = state.staging.take();
        let Some(stream) = state.stream.take() else {
            return Ok(CloseOutcome::NotStaged);
        };

        let mode = stream.mode();
        let closed_path = stream.path().to_path_buf();
        let path = stream
            .finish()
            .map_err(|e| FileRouteError::io(name, "closing", &closed_path, e))?;

        if mode == StreamMode::Append {
            return Ok(CloseOutcome::Appended(path));
        }
        let Some(staging) = staging else {
            return Ok(CloseOutcome::NotStaged);
        };

        let final_name = self
            .services
            .resolver
            .file_name(&self.config, model)
            .map_err(|source| {
                FileRouteError::routing(
                    name,
                    RoutingError::UnnamedStaging {
                        staging: staging.path().to_path_buf(),
                        source,
                    },
                )
            })?;
        let published = publish_staged(staging.path(), &final_name)
            .map_err(|e| FileRouteError::routing(name, e))?;
        debug!(
            resource = name,
            from = %staging.path().display(),
            to = %published.display(),
            "published file"
        );

        journal::record(&self.config, &self.services.resolver, session, &published)?;
        Ok(CloseOutcome::Published(published))
    }

    fn close_condition_holds(&self, session: &Session) -> Result<bool> {
        match self.config.close_on_condition() {
            Some(expression) => self
                .services
                .conditions
                .evaluate(expression, session.model())
                .map_err(|e| FileRouteError::template(self.config.name(), e)),
            None => Ok(true),
        }
    }

    fn open(&self, model: &fileroute_core::Model, cancel: &CancelHandle) -> Result<Opened> {
        let name = self.config.name();
        let pattern = self.config.destination_directory_pattern();

        let rendered = self
            .services
            .resolver
            .destination_directory(&self.config, model)
            .map_err(|e| FileRouteError::template(name, e))?;
        let directory = std::path::absolute(&rendered)
            .map_err(|e| FileRouteError::io(name, "resolving", &rendered, e))?;

        let _ = self
            .services
            .provisioner
            .ensure(&directory, pattern)
            .map_err(|e| FileRouteError::routing(name, e))?;

        // a cancelled wait still opens the stream
        let _: Admission = self.admission.admit(name, &directory, &self.matcher, cancel)?;

        if self.config.append() {
            let file_name = self
                .services
                .resolver
                .file_name(&self.config, model)
                .map_err(|e| FileRouteError::template(name, e))?;
            let path = directory.join(file_name);
            let stream = staging::open_append(&path)
                .map_err(|e| FileRouteError::io(name, "opening for append", &path, e))?;
            return Ok(Opened {
                stream,
                staging: None,
            });
        }

        let (stream, handle) = staging::create_staging_file(&directory)
            .map_err(|e| FileRouteError::io(name, "creating staging file in", &directory, e))?;
        debug!(resource = name, path = %handle.path().display(), "allocated staging file");
        Ok(Opened {
            stream,
            staging: Some(handle),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
