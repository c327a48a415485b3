//! Timing stage: measures wall-clock duration around the wrapped call and
//! emits it as a tracing event, leaving the result unchanged.
//!
//! Holds a per-call start instant, which is exactly why pipelines are built
//! from fresh stage instances: one TimingStage shared across overlapping
//! calls would race on this field.

use std::time::Instant;

use async_trait::async_trait;

use hoist_core::UploadRequest;

use crate::stage::{PluginResult, UploadStage};

#[derive(Default)]
pub struct TimingStage {
    started: Option<Instant>,
}

impl TimingStage {
    pub fn new() -> Self {
        TimingStage { started: None }
    }
}

#[async_trait]
impl UploadStage for TimingStage {
    fn name(&self) -> &str {
        "timing"
    }

    async fn before(&mut self, _req: &UploadRequest) -> PluginResult<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    async fn after(&mut self, req: &UploadRequest, result: String) -> PluginResult<String> {
        if let Some(started) = self.started.take() {
            tracing::info!(
                remote_name = %req.remote_name,
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                "Upload timing"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_instant_is_consumed_per_call() {
        let mut stage = TimingStage::new();
        let req = UploadRequest::new("/tmp/y.png", "y.png");

        stage.before(&req).await.unwrap();
        assert!(stage.started.is_some());

        let out = stage.after(&req, "url".to_string()).await.unwrap();
        assert_eq!(out, "url");
        assert!(stage.started.is_none());
    }
}
