//! GitHub repository backend
//!
//! Uploads through the GitHub contents API and serves the file from
//! raw.githubusercontent.com (or the jsDelivr CDN with the `cdn` option).
//! A 422 means the path already exists: the existing blob sha is fetched,
//! identical content is skipped, and differing content is updated when the
//! `overwrite` option allows it.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use sha1::{Digest, Sha1};

use crate::traits::{BackendArgs, BackendError, BackendResult, UploadBackend};
use hoist_core::UploadRequest;

const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("hoist/", env!("CARGO_PKG_VERSION"));

pub struct GitHubBackend {
    owner: String,
    repo: String,
    token: String,
    path_prefix: String,
    client: reqwest::Client,
}

impl GitHubBackend {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        path_prefix: &str,
    ) -> BackendResult<Self> {
        let mut path_prefix = path_prefix.trim().to_string();
        if !path_prefix.is_empty() && !path_prefix.ends_with('/') {
            path_prefix.push('/');
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BackendError::Backend(format!("Failed to build HTTP client: {e}")))?;
        Ok(GitHubBackend {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            path_prefix,
            client,
        })
    }

    /// Constructor for the capability registry.
    /// Args: `owner`, `repo`, `token`; optional `path` prefix.
    pub fn factory(args: &BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> {
        let owner = args.str_required("owner")?;
        let repo = args.str_required("repo")?;
        let token = args.str_required("token")?;
        let path = args.str_opt("path").unwrap_or("");
        Ok(Arc::new(GitHubBackend::new(owner, repo, token, path)?))
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{API_ROOT}/repos/{}/{}/contents/{}",
            self.owner, self.repo, path
        )
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/main/{}",
            self.owner, self.repo, path
        )
    }

    fn cdn_url(&self, path: &str) -> String {
        format!(
            "https://cdn.jsdelivr.net/gh/{}/{}@main/{}",
            self.owner, self.repo, path
        )
    }

    /// Sha of `content` as git computes it for blob objects.
    fn blob_sha(content: &[u8]) -> String {
        let mut hasher = Sha1::new();
        hasher.update(format!("blob {}\0", content.len()).as_bytes());
        hasher.update(content);
        hex::encode(hasher.finalize())
    }

    async fn put_contents(
        &self,
        path: &str,
        content_b64: &str,
        message: &str,
        sha: Option<&str>,
    ) -> BackendResult<reqwest::Response> {
        let mut body = serde_json::json!({
            "message": message,
            "content": content_b64,
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }
        self.client
            .put(self.contents_url(path))
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", format!("token {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Backend(format!("GitHub request failed: {e}")))
    }

    /// Fetch the blob sha of an existing path.
    async fn existing_sha(&self, path: &str) -> BackendResult<String> {
        let res = self
            .client
            .get(self.contents_url(path))
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", format!("token {}", self.token))
            .send()
            .await
            .map_err(|e| BackendError::Backend(format!("GitHub request failed: {e}")))?;
        if !res.status().is_success() {
            return Err(BackendError::Backend(format!(
                "GitHub API returned {} fetching existing content",
                res.status()
            )));
        }
        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| BackendError::Backend(format!("Invalid GitHub response: {e}")))?;
        body["sha"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| BackendError::Backend("GitHub response missing sha".to_string()))
    }

    async fn upload_contents(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        overwrite: bool,
    ) -> BackendResult<()> {
        let content_b64 = BASE64.encode(content);
        let res = self.put_contents(path, &content_b64, message, None).await?;

        match res.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let sha = self.existing_sha(path).await?;
                if sha == Self::blob_sha(content) {
                    tracing::info!(path, "Content already exists and is identical, skipping");
                    return Ok(());
                }
                if !overwrite {
                    return Err(BackendError::UploadFailed(format!(
                        "{path} already exists with different content and overwrite is disabled"
                    )));
                }
                let res = self
                    .put_contents(path, &content_b64, message, Some(&sha))
                    .await?;
                if res.status().is_success() {
                    Ok(())
                } else {
                    Err(BackendError::Backend(format!(
                        "GitHub API returned {} updating {path}",
                        res.status()
                    )))
                }
            }
            status => {
                let body = res.text().await.unwrap_or_default();
                Err(BackendError::Backend(format!(
                    "GitHub API returned {status}: {}",
                    body.trim()
                )))
            }
        }
    }
}

#[async_trait]
impl UploadBackend for GitHubBackend {
    async fn upload(&self, req: &UploadRequest) -> BackendResult<String> {
        let content = tokio::fs::read(&req.path).await?;
        let gh_path = format!("{}{}", self.path_prefix, req.remote_name);
        let message = req
            .options
            .get("message")
            .cloned()
            .unwrap_or_else(|| format!("upload {}", req.remote_name));
        let overwrite = req.flag("overwrite", true);

        let start = std::time::Instant::now();
        self.upload_contents(&gh_path, &content, &message, overwrite)
            .await?;

        tracing::info!(
            path = %gh_path,
            size_bytes = content.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GitHub upload successful"
        );

        if req.flag("cdn", false) {
            Ok(self.cdn_url(&gh_path))
        } else {
            Ok(self.raw_url(&gh_path))
        }
    }

    fn unique_id(&self) -> Option<String> {
        Some(format!("github/{}/{}", self.owner, self.repo))
    }
}
