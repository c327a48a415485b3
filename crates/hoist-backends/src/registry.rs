//! Static backend capability registry
//!
//! A fixed mapping from capability name to constructor, populated explicitly
//! at process start. The engine resolves each configured client against this
//! registry exactly once; an unresolvable capability becomes an unavailable
//! client descriptor upstream, never an error here.

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::{BackendArgs, BackendResult, UploadBackend};

/// Constructor for one backend capability.
pub type BackendFactory =
    Arc<dyn Fn(&BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> + Send + Sync>;

/// Registry of backend constructors, keyed by capability name.
///
/// Read-only after initialization; cheap to share by reference across the
/// engine's registries.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl CapabilityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        CapabilityRegistry {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with every built-in backend.
    pub fn builtin() -> Self {
        let mut registry = CapabilityRegistry::new();
        registry.register("local", crate::local::LocalBackend::factory);
        registry.register("command", crate::command::CommandBackend::factory);
        registry.register("github", crate::github::GitHubBackend::factory);
        #[cfg(feature = "backend-s3")]
        registry.register("s3", crate::s3::S3Backend::factory);
        registry
    }

    /// Register a constructor under `name`. Later registrations replace
    /// earlier ones, so applications can override a built-in.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BackendArgs) -> BackendResult<Arc<dyn UploadBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Resolve a capability name to its constructor, if registered.
    pub fn resolve(&self, name: &str) -> Option<BackendFactory> {
        self.factories.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered capability names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FnBackend;

    #[test]
    fn builtin_registry_knows_every_backend() {
        let registry = CapabilityRegistry::builtin();
        assert!(registry.contains("local"));
        assert!(registry.contains("command"));
        assert!(registry.contains("github"));
        #[cfg(feature = "backend-s3")]
        assert!(registry.contains("s3"));
        assert!(!registry.contains("ftp"));
    }

    #[test]
    fn resolve_unknown_capability_is_none() {
        let registry = CapabilityRegistry::builtin();
        assert!(registry.resolve("carrier-pigeon").is_none());
    }

    #[tokio::test]
    async fn custom_factory_can_capture_state() {
        let mut registry = CapabilityRegistry::new();
        registry.register("fake", |_args: &BackendArgs| {
            let backend = FnBackend::new(|req| {
                Box::pin(async move { Ok(format!("fake://{}", req.remote_name)) })
            });
            Ok(Arc::new(backend) as Arc<dyn UploadBackend>)
        });

        let factory = registry.resolve("fake").unwrap();
        let backend = factory(&BackendArgs::default()).unwrap();
        let req = hoist_core::UploadRequest::new("/tmp/a", "a");
        assert_eq!(backend.upload(&req).await.unwrap(), "fake://a");
    }
}
