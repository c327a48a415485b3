//! Markdown link stage: rewrites a bare URL into a markdown image
//! reference, unless the value already is one.

use async_trait::async_trait;

use hoist_core::UploadRequest;

use crate::stage::{PluginResult, UploadStage};

pub struct MarkdownLinkStage;

#[async_trait]
impl UploadStage for MarkdownLinkStage {
    fn name(&self) -> &str {
        "markdown_link"
    }

    async fn after(&mut self, _req: &UploadRequest, result: String) -> PluginResult<String> {
        if result.starts_with("![") {
            Ok(result)
        } else {
            Ok(format!("![]({result})"))
        }
    }
}
