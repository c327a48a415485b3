//! Backend abstraction trait
//!
//! This module defines the UploadBackend trait that all destinations must
//! implement, plus the two declared backend shapes: an object backend (any
//! struct implementing the trait) and [`FnBackend`], the plain-function
//! variant wrapping a bare async callable.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use hoist_core::UploadRequest;

/// Backend operation errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid backend arguments: {0}")]
    InvalidArgs(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// One remote upload destination.
///
/// Implementations upload the request's local file under its resolved remote
/// name and return the publicly accessible URL. Timeouts, retries and
/// authentication are backend-owned; the engine passes the request through
/// opaquely and never retries.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn upload(&self, req: &UploadRequest) -> BackendResult<String>;

    /// Stable identifier the destination supplies for itself, if any.
    /// When `None`, the uploader's configured name is used instead.
    fn unique_id(&self) -> Option<String> {
        None
    }
}

impl std::fmt::Debug for dyn UploadBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBackend").finish_non_exhaustive()
    }
}

type UploadFn =
    dyn Fn(UploadRequest) -> BoxFuture<'static, BackendResult<String>> + Send + Sync;

/// Plain-function backend: wraps a bare async callable as an
/// [`UploadBackend`]. The counterpart of factories that return a function
/// rather than a destination object.
#[derive(Clone)]
pub struct FnBackend {
    func: Arc<UploadFn>,
    unique_id: Option<String>,
}

impl FnBackend {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(UploadRequest) -> BoxFuture<'static, BackendResult<String>>
            + Send
            + Sync
            + 'static,
    {
        FnBackend {
            func: Arc::new(func),
            unique_id: None,
        }
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }
}

#[async_trait]
impl UploadBackend for FnBackend {
    async fn upload(&self, req: &UploadRequest) -> BackendResult<String> {
        (self.func)(req.clone()).await
    }

    fn unique_id(&self) -> Option<String> {
        self.unique_id.clone()
    }
}

/// Constructor arguments for a backend. Keys are case-normalized to
/// lowercase on construction so `Bucket` and `bucket` configure the same
/// thing.
#[derive(Debug, Clone, Default)]
pub struct BackendArgs(BTreeMap<String, toml::Value>);

impl BackendArgs {
    pub fn from_config(args: &BTreeMap<String, toml::Value>) -> Self {
        BackendArgs(
            args.iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
        )
    }

    /// Overlay `over` onto these args; upper-layer keys win.
    pub fn merged_with(&self, over: &BackendArgs) -> BackendArgs {
        let mut merged = self.0.clone();
        for (k, v) in &over.0 {
            merged.insert(k.clone(), v.clone());
        }
        BackendArgs(merged)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn str_opt(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn str_required(&self, key: &str) -> BackendResult<&str> {
        self.str_opt(key).ok_or_else(|| {
            BackendError::InvalidArgs(format!("missing required argument `{key}`"))
        })
    }
}
