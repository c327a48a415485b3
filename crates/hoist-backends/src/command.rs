//! External command backend
//!
//! Runs a configured command template to perform the upload, then renders a
//! URL template for the result. Lets any existing CLI uploader (rsync, scp,
//! ossutil, rclone, ...) act as a destination without a dedicated backend.
//!
//! Template placeholders: `${file_path}` and `${rename}` in the command,
//! `${name}` (percent-encoded) in the URL.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::process::Command;

use crate::traits::{BackendArgs, BackendError, BackendResult, UploadBackend};
use hoist_core::UploadRequest;

/// Everything except unreserved characters and '/' is escaped in URL names.
const URL_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

pub struct CommandBackend {
    cmd_template: String,
    url_template: String,
}

impl CommandBackend {
    pub fn new(cmd_template: impl Into<String>, url_template: impl Into<String>) -> Self {
        CommandBackend {
            cmd_template: cmd_template.into(),
            url_template: url_template.into(),
        }
    }

    /// Constructor for the capability registry.
    /// Args: `cmd_template`, `url_template`.
    pub fn factory(args: &BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> {
        let cmd_template = args.str_required("cmd_template")?;
        let url_template = args.str_required("url_template")?;
        Ok(Arc::new(CommandBackend::new(cmd_template, url_template)))
    }

    fn render_command(&self, req: &UploadRequest) -> BackendResult<Vec<String>> {
        let command = self
            .cmd_template
            .replace("${file_path}", &req.path.to_string_lossy())
            .replace("${rename}", &req.remote_name);
        let argv = shell_words::split(&command)
            .map_err(|e| BackendError::InvalidArgs(format!("bad command template: {e}")))?;
        if argv.is_empty() {
            return Err(BackendError::InvalidArgs(
                "command template rendered to an empty command".to_string(),
            ));
        }
        Ok(argv)
    }

    fn render_url(&self, name: &str) -> String {
        let encoded = utf8_percent_encode(name, URL_NAME).to_string();
        self.url_template.replace("${name}", &encoded)
    }
}

#[async_trait]
impl UploadBackend for CommandBackend {
    async fn upload(&self, req: &UploadRequest) -> BackendResult<String> {
        let argv = self.render_command(req)?;
        tracing::debug!(command = ?argv, "Running upload command");

        let start = std::time::Instant::now();
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                BackendError::UploadFailed(format!("Failed to run `{}`: {}", argv[0], e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::UploadFailed(format!(
                "`{}` exited with {}: {}",
                argv[0],
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(
            command = %argv[0],
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Command upload successful"
        );

        Ok(self.render_url(&req.remote_name))
    }
}
