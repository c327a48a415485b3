//! Local filesystem backend
//!
//! Copies the file into a base directory and returns `{base_url}/{name}`.
//! Useful when a web server already serves the directory, and as the
//! reference backend in tests.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use crate::traits::{BackendArgs, BackendError, BackendResult, UploadBackend};
use hoist_core::UploadRequest;

pub struct LocalBackend {
    base_path: PathBuf,
    base_url: String,
}

impl LocalBackend {
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        LocalBackend {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    /// Constructor for the capability registry. Args: `path`, `base_url`.
    pub fn factory(args: &BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> {
        let base_path = args.str_required("path")?;
        let base_url = args.str_required("base_url")?;
        Ok(Arc::new(LocalBackend::new(base_path, base_url)))
    }

    /// Reject remote names that would escape the base directory.
    fn validate_name(name: &str) -> BackendResult<()> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return Err(BackendError::InvalidArgs(format!(
                "remote name escapes the storage directory: {name:?}"
            )));
        }
        Ok(())
    }

    fn generate_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

#[async_trait]
impl UploadBackend for LocalBackend {
    async fn upload(&self, req: &UploadRequest) -> BackendResult<String> {
        Self::validate_name(&req.remote_name)?;
        let dest = self.base_path.join(&req.remote_name);

        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            BackendError::Backend(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let start = std::time::Instant::now();

        let size = fs::copy(&req.path, &dest).await.map_err(|e| {
            BackendError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                req.path.display(),
                dest.display(),
                e
            ))
        })?;

        let url = self.generate_url(&req.remote_name);

        tracing::info!(
            path = %req.path.display(),
            dest = %dest.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(url)
    }
}
