//! Named resources addressed by the pipeline.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use fileroute_core::{ConfigurationError, FileRouteError, ResourceConfig, Result, RoutingError};
use serde_json::Value;
use tracing::warn;

use crate::journal;
use crate::resource::{CloseOutcome, FileOutputResource, ResourceServices};
use crate::session::Session;

/// A payload written through a resource.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    /// UTF-8 text, written as-is.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A JSON value, serialized compactly.
    Json(Value),
}

impl Content {
    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        match self {
            Self::Text(text) => out.write_all(text.as_bytes()),
            Self::Bytes(bytes) => out.write_all(bytes),
            Self::Json(value) => serde_json::to_writer(&mut *out, value).map_err(std::io::Error::from),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// The set of configured resources, keyed by name.
#[derive(Debug, Default)]
pub struct OutputRouter {
    resources: BTreeMap<String, FileOutputResource>,
    services: ResourceServices,
}

impl OutputRouter {
    /// Empty router sharing `services` across its resources.
    pub fn new(services: ResourceServices) -> Self {
        Self {
            resources: BTreeMap::new(),
            services,
        }
    }

    /// Router with every config in `configs` registered.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ResourceConfig>,
        services: ResourceServices,
    ) -> std::result::Result<Self, ConfigurationError> {
        let mut router = Self::new(services);
        for config in configs {
            router.register(config)?;
        }
        Ok(router)
    }

    /// Initialize and add a resource. Names must be unique.
    pub fn register(&mut self, config: ResourceConfig) -> std::result::Result<(), ConfigurationError> {
        if self.resources.contains_key(config.name()) {
            return Err(ConfigurationError::DuplicateResource {
                name: config.name().to_owned(),
            });
        }
        let resource = FileOutputResource::initialize(config, self.services.clone())?;
        let _ = self.resources.insert(resource.name().to_owned(), resource);
        Ok(())
    }

    /// Resource registered under `name`.
    pub fn resource(&self, name: &str) -> Option<&FileOutputResource> {
        self.resources.get(name)
    }

    /// Registered names in sorted order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    fn lookup(&self, name: &str) -> Result<&FileOutputResource> {
        self.resources.get(name).ok_or_else(|| {
            FileRouteError::routing(
                name,
                RoutingError::UnknownResource {
                    name: name.to_owned(),
                },
            )
        })
    }

    /// Write `content` to the session's stream for `resource`, opening it if needed.
    pub fn write(&self, session: &mut Session, resource: &str, content: &Content) -> Result<()> {
        let target = self.lookup(resource)?;
        let stream = target.acquire(session)?;
        content
            .write_to(stream)
            .and_then(|()| stream.flush())
            .map_err(|e| FileRouteError::io(resource, "writing", stream.path(), e))
    }

    /// End of the element that drove `resource`: close if its condition holds.
    pub fn visit_end(&self, session: &mut Session, resource: &str) -> Result<CloseOutcome> {
        self.lookup(resource)?.close(session)
    }

    /// Tear the session down.
    ///
    /// Every still-open stream is closed and published regardless of its close
    /// condition, then all journals are closed. Returns the paths published
    /// here, or the first failure; later failures are logged.
    pub fn end_session(&self, session: &mut Session) -> Result<Vec<PathBuf>> {
        let mut published = Vec::new();
        let mut first_error = None;
        for resource in self.resources.values() {
            if !session.is_open(resource.name()) {
                continue;
            }
            match resource.finish(session) {
                Ok(CloseOutcome::Published(path)) => published.push(path),
                Ok(_) => {}
                Err(error) if first_error.is_none() => first_error = Some(error),
                Err(error) => {
                    warn!(resource = resource.name(), %error, "failed to publish at session end");
                }
            }
        }
        journal::close_all(session);
        first_error.map_or(Ok(published), Err)
    }
}
