//! Client registry
//!
//! A client is a named binding of a backend capability. Resolution against
//! the static capability registry happens here, exactly once per client:
//! an unknown capability yields an unavailable descriptor (warned, not
//! raised), while a duplicate client name is a fatal configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use hoist_backends::{
    BackendArgs, BackendError, BackendFactory, BackendResult, CapabilityRegistry, UploadBackend,
};
use hoist_core::{ClientConfig, Error, Result};

/// One configured client: capability name, resolved constructor (if any)
/// and base constructor arguments.
pub struct ClientDescriptor {
    name: String,
    capability: String,
    args: BackendArgs,
    factory: Option<BackendFactory>,
}

impl ClientDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// True iff the capability resolved to a constructor.
    pub fn available(&self) -> bool {
        self.factory.is_some()
    }

    /// Build a backend instance from the client's base args overlaid with
    /// `extra` (an uploader's args; its keys win).
    pub fn build(&self, extra: &BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> {
        let factory = self.factory.as_ref().ok_or_else(|| {
            BackendError::Backend(format!(
                "client `{}` has no resolved capability `{}`",
                self.name, self.capability
            ))
        })?;
        factory(&self.args.merged_with(extra))
    }
}

/// Registry of configured clients, keyed by name.
///
/// Read-only after construction.
#[derive(Default)]
pub struct ClientRegistry {
    clients: HashMap<String, ClientDescriptor>,
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish_non_exhaustive()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        ClientRegistry {
            clients: HashMap::new(),
        }
    }

    /// Build a registry from the `[[client]]` section.
    pub fn from_config(
        configs: &[ClientConfig],
        capabilities: &CapabilityRegistry,
    ) -> Result<Self> {
        let mut registry = ClientRegistry::new();
        for config in configs {
            registry.register(config, capabilities)?;
        }
        Ok(registry)
    }

    /// Register one client. The capability is resolved here and never again.
    pub fn register(
        &mut self,
        config: &ClientConfig,
        capabilities: &CapabilityRegistry,
    ) -> Result<()> {
        if self.clients.contains_key(&config.name) {
            return Err(Error::Config(format!(
                "client name already exists: {}",
                config.name
            )));
        }

        let factory = capabilities.resolve(&config.capability);
        if factory.is_none() {
            tracing::warn!(
                client = %config.name,
                capability = %config.capability,
                "Unknown capability, client marked unavailable"
            );
        } else {
            tracing::debug!(client = %config.name, capability = %config.capability, "Client registered");
        }

        self.clients.insert(
            config.name.clone(),
            ClientDescriptor {
                name: config.name.clone(),
                capability: config.capability.clone(),
                args: BackendArgs::from_config(&config.args),
                factory,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ClientDescriptor> {
        self.clients.get(name)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
