//! Uploader registry
//!
//! Uploaders are named, prioritized destinations bound to a client. The
//! backend instance is built once at registration; a client that is missing
//! its capability or whose constructor fails leaves the uploader registered
//! but unavailable. Registration order is preserved for deterministic
//! priority tie-breaks and iteration.

use std::collections::HashMap;
use std::sync::Arc;

use hoist_backends::{BackendArgs, UploadBackend};
use hoist_core::{Error, Result, UploaderConfig};

use crate::clients::ClientRegistry;

/// One registered uploader.
pub struct Uploader {
    name: String,
    client_name: String,
    priority: i32,
    unique_id: String,
    backend: Option<Arc<dyn UploadBackend>>,
}

impl Uploader {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Backend-supplied identity, falling back to the configured name.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn available(&self) -> bool {
        self.backend.is_some()
    }

    /// The bound backend, or [`Error::UploaderNotAvailable`].
    pub fn backend(&self) -> Result<Arc<dyn UploadBackend>> {
        self.backend
            .clone()
            .ok_or_else(|| Error::UploaderNotAvailable(self.name.clone()))
    }
}

/// Registry of configured uploaders, in registration order.
#[derive(Default)]
pub struct UploaderRegistry {
    uploaders: Vec<Uploader>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for UploaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploaderRegistry").finish_non_exhaustive()
    }
}

impl UploaderRegistry {
    pub fn new() -> Self {
        UploaderRegistry {
            uploaders: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Build a registry from the `[[uploader]]` section, binding each entry
    /// to its client.
    pub fn from_config(configs: &[UploaderConfig], clients: &ClientRegistry) -> Result<Self> {
        let mut registry = UploaderRegistry::new();
        for config in configs {
            registry.register(config, clients)?;
        }
        Ok(registry)
    }

    /// Register one uploader. An unknown client name is a configuration
    /// error; a known but unavailable client, or a failing backend
    /// constructor, degrades the uploader to unavailable.
    pub fn register(&mut self, config: &UploaderConfig, clients: &ClientRegistry) -> Result<()> {
        if self.by_name.contains_key(&config.name) {
            return Err(Error::Config(format!(
                "uploader name already exists: {}",
                config.name
            )));
        }

        let client_name = config.client_name();
        let client = clients.get(client_name).ok_or_else(|| {
            Error::Config(format!(
                "uploader `{}` references unknown client `{client_name}`",
                config.name
            ))
        })?;

        let backend = if client.available() {
            match client.build(&BackendArgs::from_config(&config.args)) {
                Ok(backend) => Some(backend),
                Err(err) => {
                    tracing::warn!(
                        uploader = %config.name,
                        client = %client_name,
                        error = %err,
                        "Backend construction failed, uploader marked unavailable"
                    );
                    None
                }
            }
        } else {
            tracing::warn!(
                uploader = %config.name,
                client = %client_name,
                "Client unavailable, uploader marked unavailable"
            );
            None
        };

        let unique_id = backend
            .as_ref()
            .and_then(|b| b.unique_id())
            .unwrap_or_else(|| config.name.clone());

        self.by_name
            .insert(config.name.clone(), self.uploaders.len());
        self.uploaders.push(Uploader {
            name: config.name.clone(),
            client_name: client_name.to_string(),
            priority: config.priority,
            unique_id,
            backend,
        });
        Ok(())
    }

    /// Look up an uploader by name. With `require_available` the result is
    /// additionally checked for a bound backend.
    pub fn get(&self, name: &str, require_available: bool) -> Result<&Uploader> {
        let uploader = self
            .by_name
            .get(name)
            .map(|&idx| &self.uploaders[idx])
            .ok_or_else(|| Error::UploaderNotFound(name.to_string()))?;
        if require_available && !uploader.available() {
            return Err(Error::UploaderNotAvailable(name.to_string()));
        }
        Ok(uploader)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Pick the available uploader with the lowest priority value,
    /// registration order breaking ties.
    pub fn auto_select(&self) -> Result<&Uploader> {
        self.uploaders
            .iter()
            .filter(|u| u.available())
            .min_by_key(|u| u.priority)
            .ok_or(Error::NoAvailableUploader)
    }

    /// All uploaders in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Uploader> {
        self.uploaders.iter()
    }

    pub fn len(&self) -> usize {
        self.uploaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaders.is_empty()
    }
}
