//! # fileroute-output
//!
//! Managed file output for document-processing pipelines.
//!
//! A [`FileOutputResource`] hands out a writable stream per session. Bytes go
//! to a hidden staging file in a templated destination directory and appear
//! under their final name only once the stream is closed, by an atomic
//! rename. Optional features per resource:
//!
//! - a high-water mark that blocks new streams while the destination holds
//!   too many matching files
//! - append mode, which writes straight into the final file
//! - a list journal recording every published path
//! - a close condition that keeps a stream open across several visits
//!
//! [`OutputRouter`] groups resources by name and drives session teardown.

#![deny(unsafe_code)]

pub mod admission;
pub mod journal;
pub mod provision;
pub mod publish;
pub mod resource;
pub mod router;
pub mod session;
pub mod staging;

pub use admission::{Admission, AdmissionController, CancelHandle, count_matching};
pub use journal::JournalHandle;
pub use provision::{DirectoryProvisioner, Provisioned};
pub use publish::publish_staged;
pub use resource::{CloseOutcome, FileOutputResource, ResourceServices};
pub use router::{Content, OutputRouter};
pub use session::Session;
pub use staging::{OutputStream, STAGING_SUFFIX, StagingHandle, StreamMode, is_staging_file_name};
