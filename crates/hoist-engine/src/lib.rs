//! Hoist engine
//!
//! The orchestration core: registries binding configuration to backend
//! constructors, rule matching, uploader selection, and the single `upload`
//! entry point that drives the plugin pipeline.
//!
//! Construction order follows the dependency chain: clients resolve against
//! the static capability registry, uploaders bind to clients, rules validate
//! against uploaders and plugins, and the [`Orchestrator`] ties them
//! together. Everything is read-only after construction except the pinned
//! current-uploader cache.

pub mod clients;
pub mod orchestrator;
pub mod rules;
pub mod uploaders;

pub use clients::{ClientDescriptor, ClientRegistry};
pub use orchestrator::{Orchestrator, UploadOptions, UploadOutcome};
pub use rules::{RuleMatcher, UploadRule};
pub use uploaders::{Uploader, UploaderRegistry};

// The engine's public error surface is the core taxonomy.
pub use hoist_core::{Error, Result};
