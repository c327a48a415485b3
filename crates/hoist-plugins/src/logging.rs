//! Logging stage: reports the call's input and output, altering neither.

use async_trait::async_trait;

use hoist_core::UploadRequest;

use crate::stage::{PluginResult, UploadStage};

pub struct LoggingStage;

#[async_trait]
impl UploadStage for LoggingStage {
    fn name(&self) -> &str {
        "logging"
    }

    async fn before(&mut self, req: &UploadRequest) -> PluginResult<()> {
        tracing::info!(
            path = %req.path.display(),
            remote_name = %req.remote_name,
            options = ?req.options,
            "Upload input"
        );
        Ok(())
    }

    async fn after(&mut self, _req: &UploadRequest, result: String) -> PluginResult<String> {
        tracing::info!(result = %result, "Upload output");
        Ok(result)
    }
}
