//! S3-compatible object store backend
//!
//! Works against AWS S3 and any S3-compatible provider (MinIO, Aliyun OSS,
//! DigitalOcean Spaces, ...) through `object_store`. The returned URL uses
//! the virtual-hosted style: `https://{bucket}.{host}/{key}`.

use std::sync::Arc;

use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};

use crate::traits::{BackendArgs, BackendError, BackendResult, UploadBackend};
use hoist_core::UploadRequest;

pub struct S3Backend {
    store: AmazonS3,
    bucket: String,
    host: String,
    prefix: String,
}

impl S3Backend {
    /// Constructor for the capability registry.
    /// Args: `bucket`, `endpoint`; optional `access_key`, `access_secret`,
    /// `region`, `path` prefix.
    pub fn factory(args: &BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> {
        let bucket = args.str_required("bucket")?.to_string();
        let endpoint = args.str_required("endpoint")?;

        let (endpoint_url, host, allow_http) = if let Some(rest) = endpoint.strip_prefix("http://")
        {
            (endpoint.to_string(), rest.to_string(), true)
        } else if let Some(rest) = endpoint.strip_prefix("https://") {
            (endpoint.to_string(), rest.to_string(), false)
        } else {
            (format!("https://{endpoint}"), endpoint.to_string(), false)
        };

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&bucket)
            .with_endpoint(endpoint_url)
            .with_region(args.str_opt("region").unwrap_or("us-east-1"))
            .with_allow_http(allow_http);
        if let Some(access_key) = args.str_opt("access_key") {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(access_secret) = args.str_opt("access_secret") {
            builder = builder.with_secret_access_key(access_secret);
        }
        let store = builder
            .build()
            .map_err(|e| BackendError::InvalidArgs(format!("bad S3 configuration: {e}")))?;

        let mut prefix = args.str_opt("path").unwrap_or("").trim().to_string();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }

        Ok(Arc::new(S3Backend {
            store,
            bucket,
            host,
            prefix,
        }))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.host, key)
    }
}

#[async_trait]
impl UploadBackend for S3Backend {
    async fn upload(&self, req: &UploadRequest) -> BackendResult<String> {
        let data = tokio::fs::read(&req.path).await?;
        let key = format!("{}{}", self.prefix, req.remote_name);
        let location = ObjectPath::parse(&key)
            .map_err(|e| BackendError::InvalidArgs(format!("bad object key {key:?}: {e}")))?;
        let size = data.len();

        let start = std::time::Instant::now();
        self.store
            .put(&location, PutPayload::from(data))
            .await
            .map_err(|e| BackendError::UploadFailed(format!("S3 put failed for {key}: {e}")))?;

        tracing::info!(
            key = %key,
            bucket = %self.bucket,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.public_url(&key))
    }

    fn unique_id(&self) -> Option<String> {
        Some(format!("{}.{}", self.bucket, self.host))
    }
}
