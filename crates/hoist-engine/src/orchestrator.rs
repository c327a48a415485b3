//! Upload orchestrator
//!
//! The single entry point tying the registries together. Construction
//! validates the whole configuration up front; `upload` then only has to
//! pick an uploader, build a fresh stage pipeline, and drive it.
//!
//! Uploader choice for one call, highest precedence first: an explicit name
//! in the options, the pinned selection from [`Orchestrator::select`], the
//! first matching rule's target, and finally priority-based auto-selection.
//! A matching rule still contributes its plugin list even when it loses the
//! uploader choice.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use hoist_backends::CapabilityRegistry;
use hoist_core::{Error, RemoteName, Result, Settings, UploadRequest};
use hoist_plugins::{StageRegistry, UploadPipeline};

use crate::clients::ClientRegistry;
use crate::rules::RuleMatcher;
use crate::uploaders::{Uploader, UploaderRegistry};

/// Per-call options for [`Orchestrator::upload`].
#[derive(Default)]
pub struct UploadOptions {
    /// Remote name policy. Defaults to the local file's base name.
    pub rename: RemoteName,
    /// Explicit uploader name; overrides every other selection source.
    pub uploader: Option<String>,
    /// Explicit plugin list; `None` falls back to the matched rule's list.
    pub plugins: Option<Vec<String>>,
    /// Opaque options passed through to backends and stages.
    pub options: BTreeMap<String, String>,
}

/// What one successful upload resolved to.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub url: String,
    /// Name of the uploader that served the call.
    pub uploader: String,
}

pub struct Orchestrator {
    clients: ClientRegistry,
    uploaders: UploaderRegistry,
    rules: RuleMatcher,
    stages: StageRegistry,
    /// Pinned uploader name set via `select`, used until changed.
    selected: Mutex<Option<String>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build an orchestrator from settings against explicit capability and
    /// stage registries. Any invalid reference in the configuration fails
    /// construction.
    pub fn from_settings(
        settings: &Settings,
        capabilities: &CapabilityRegistry,
        stages: StageRegistry,
    ) -> Result<Self> {
        let clients = ClientRegistry::from_config(&settings.clients, capabilities)?;
        let uploaders = UploaderRegistry::from_config(&settings.uploaders, &clients)?;
        let rules = RuleMatcher::from_config(&settings.rules, &uploaders, &stages)?;
        tracing::debug!(
            clients = clients.len(),
            uploaders = uploaders.len(),
            rules = rules.len(),
            "Orchestrator ready"
        );
        Ok(Orchestrator {
            clients,
            uploaders,
            rules,
            stages,
            selected: Mutex::new(None),
        })
    }

    /// Build an orchestrator with the built-in backends and stages.
    pub fn builtin(settings: &Settings) -> Result<Self> {
        Orchestrator::from_settings(settings, &CapabilityRegistry::builtin(), StageRegistry::builtin())
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn uploaders(&self) -> &UploaderRegistry {
        &self.uploaders
    }

    /// Pin `name` as the uploader for subsequent calls. The uploader must
    /// exist and be available.
    pub fn select(&self, name: &str) -> Result<()> {
        self.uploaders.get(name, true)?;
        *self.lock_selected() = Some(name.to_string());
        tracing::info!(uploader = %name, "Uploader selected");
        Ok(())
    }

    /// The pinned uploader name, if any.
    pub fn selected(&self) -> Option<String> {
        self.lock_selected().clone()
    }

    /// Look up an uploader that must be usable right now.
    pub fn get_uploader(&self, name: &str) -> Result<&Uploader> {
        self.uploaders.get(name, true)
    }

    /// Look up an uploader regardless of availability.
    pub fn lookup_uploader(&self, name: &str) -> Result<&Uploader> {
        self.uploaders.get(name, false)
    }

    /// Upload `path` and return the destination URL.
    pub async fn upload(&self, path: &Path, opts: UploadOptions) -> Result<String> {
        Ok(self.upload_detailed(path, opts).await?.url)
    }

    /// Upload `path`, returning the URL together with the name of the
    /// uploader that served the call.
    pub async fn upload_detailed(&self, path: &Path, opts: UploadOptions) -> Result<UploadOutcome> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let matched = self.rules.first_match(path);
        if let Some(rule) = matched {
            tracing::debug!(rule = %rule.name(), path = %path.display(), "Rule matched");
        }

        let pinned = self.selected();
        let uploader = if let Some(name) = opts.uploader.as_deref() {
            self.uploaders.get(name, true)?
        } else if let Some(name) = pinned.as_deref() {
            self.uploaders.get(name, true)?
        } else if let Some(rule) = matched {
            self.uploaders.get(rule.uploader(), true)?
        } else {
            self.uploaders.auto_select()?
        };

        let plugins: Vec<String> = match &opts.plugins {
            Some(list) => list.clone(),
            None => matched.map(|rule| rule.plugins().to_vec()).unwrap_or_default(),
        };
        let pipeline = UploadPipeline::new(self.stages.build_all(&plugins)?);

        let remote_name = opts.rename.resolve(path);
        let req = UploadRequest::new(path, remote_name).with_options(opts.options);

        tracing::info!(
            path = %path.display(),
            remote_name = %req.remote_name,
            uploader = %uploader.name(),
            plugins = plugins.len(),
            "Upload started"
        );
        let started = Instant::now();

        let result = pipeline
            .invoke(uploader.backend()?, &req)
            .await
            .map_err(|err| Error::Upload(err.to_string()));

        match &result {
            Ok(url) => tracing::info!(
                url = %url,
                uploader = %uploader.name(),
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                "Upload finished"
            ),
            Err(err) => tracing::error!(
                error = %err,
                uploader = %uploader.name(),
                duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                "Upload failed"
            ),
        }
        result.map(|url| UploadOutcome {
            url,
            uploader: uploader.name().to_string(),
        })
    }

    fn lock_selected(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.selected.lock().unwrap_or_else(|err| err.into_inner())
    }
}
