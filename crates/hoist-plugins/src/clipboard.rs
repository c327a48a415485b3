//! Clipboard stage: copies the final result to the system clipboard and
//! passes it through unchanged. A missing or broken clipboard (headless
//! session, no display server) is a warning, never an upload failure.

use async_trait::async_trait;

use hoist_core::UploadRequest;

use crate::stage::{PluginResult, UploadStage};

pub struct ClipboardStage;

#[async_trait]
impl UploadStage for ClipboardStage {
    fn name(&self) -> &str {
        "clipboard"
    }

    async fn after(&mut self, _req: &UploadRequest, result: String) -> PluginResult<String> {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(result.clone()))
        {
            Ok(()) => tracing::info!("Result copied to clipboard"),
            Err(err) => tracing::warn!(error = %err, "Clipboard unavailable, result not copied"),
        }
        Ok(result)
    }
}
