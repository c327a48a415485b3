//! Stage trait and pipeline driver
//!
//! The driver owns the nesting semantics so individual stages cannot get
//! ordering wrong: [`Next`] peels off the outermost remaining stage, runs
//! its hooks around the rest, and bottoms out at the backend. A stage that
//! overrides [`UploadStage::around`] without invoking `next` short-circuits
//! every stage (and the backend) inside it.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use hoist_backends::{BackendError, UploadBackend};
use hoist_core::UploadRequest;

/// Pipeline execution errors
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("Stage `{stage}` failed: {message}")]
    Stage { stage: String, message: String },
}

impl PluginError {
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        PluginError::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations
pub type PluginResult<T> = Result<T, PluginError>;

/// One composable wrapper around an upload call.
///
/// Hooks take `&mut self`: a stage may keep per-call state between its own
/// hooks. Instances must be fresh per logical call; the registry's
/// factories guarantee that for pipelines it builds.
#[async_trait]
pub trait UploadStage: Send {
    fn name(&self) -> &str;

    /// Runs before anything inside this stage. Side effects only.
    async fn before(&mut self, _req: &UploadRequest) -> PluginResult<()> {
        Ok(())
    }

    /// The wrapped call itself. Defaults to delegating inward; an override
    /// that never runs `next` replaces the inner stages and the backend.
    async fn around(&mut self, req: &UploadRequest, next: Next) -> PluginResult<String> {
        next.run(req).await
    }

    /// Runs after the wrapped call; may rewrite the result.
    async fn after(&mut self, _req: &UploadRequest, result: String) -> PluginResult<String> {
        Ok(result)
    }
}

impl std::fmt::Debug for dyn UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadStage")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// The remainder of a pipeline: the stages inside the current one, plus the
/// backend at the bottom.
pub struct Next {
    backend: Arc<dyn UploadBackend>,
    stages: Vec<Box<dyn UploadStage>>,
}

impl Next {
    /// Run the rest of the pipeline. Recurses from the outermost remaining
    /// stage inward; the empty remainder is the backend call.
    pub fn run(mut self, req: &UploadRequest) -> BoxFuture<'_, PluginResult<String>> {
        Box::pin(async move {
            match self.stages.pop() {
                Some(mut stage) => {
                    stage.before(req).await?;
                    let result = stage.around(req, self).await?;
                    stage.after(req, result).await
                }
                None => self.backend.upload(req).await.map_err(PluginError::from),
            }
        })
    }
}

/// An ordered stage list composed around one backend call.
///
/// For stages [p1, p2, ..., pn] the effective call is pn(pn-1(...p1(f0)...)):
/// the last stage in the list is outermost. A pipeline is consumed by
/// `invoke`, one pipeline per logical call.
pub struct UploadPipeline {
    stages: Vec<Box<dyn UploadStage>>,
}

impl UploadPipeline {
    pub fn new(stages: Vec<Box<dyn UploadStage>>) -> Self {
        UploadPipeline { stages }
    }

    pub fn empty() -> Self {
        UploadPipeline { stages: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn invoke(
        self,
        backend: Arc<dyn UploadBackend>,
        req: &UploadRequest,
    ) -> PluginResult<String> {
        Next {
            backend,
            stages: self.stages,
        }
        .run(req)
        .await
    }
}
