//! Hoist core types
//!
//! This crate carries the pieces shared by every other Hoist crate: the error
//! taxonomy, the typed configuration model with its layered merge, and the
//! per-call upload request / remote-name types.
//!
//! # Error contract
//!
//! Construction-time problems (duplicate names, unknown references, malformed
//! rules) surface as [`Error::Config`] and abort startup. Per-call failures
//! raised by a backend or a pipeline stage are always collapsed into a single
//! [`Error::Upload`] carrying the original failure text, so callers of
//! `upload` only ever need to handle that one variant.

pub mod config;
pub mod error;
pub mod request;

pub use config::{
    ClientConfig, RuleConfig, Settings, UploaderConfig, DEFAULT_PRIORITY, STARTER_CONFIG,
};
pub use error::{Error, Result};
pub use request::{RemoteName, UploadRequest};
