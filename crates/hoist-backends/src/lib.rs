//! Hoist backend library
//!
//! This crate provides the backend abstraction and the built-in destination
//! implementations. A backend is one remote destination behind a single
//! upload capability: it takes an [`hoist_core::UploadRequest`] and returns
//! a public URL.
//!
//! Backends are never resolved at call time. The [`registry`] module holds a
//! static capability registry (name → constructor) populated at process
//! start; the engine resolves each configured client against it exactly once.

pub mod command;
pub mod github;
pub mod local;
pub mod registry;
#[cfg(feature = "backend-s3")]
pub mod s3;
pub mod traits;

pub use command::CommandBackend;
pub use github::GitHubBackend;
pub use local::LocalBackend;
pub use registry::{BackendFactory, CapabilityRegistry};
#[cfg(feature = "backend-s3")]
pub use s3::S3Backend;
pub use traits::{BackendArgs, BackendError, BackendResult, FnBackend, UploadBackend};
