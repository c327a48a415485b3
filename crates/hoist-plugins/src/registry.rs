//! Stage registry
//!
//! Maps plugin names to factories. A factory builds a fresh stage instance
//! for every pipeline, which is what makes per-call mutable stage state
//! safe under concurrent uploads.

use std::collections::HashMap;

use hoist_core::{Error, Result};

use crate::clipboard::ClipboardStage;
use crate::logging::LoggingStage;
use crate::markdown_link::MarkdownLinkStage;
use crate::stage::UploadStage;
use crate::timing::TimingStage;

/// Builds one fresh stage instance per invocation.
pub type StageFactory = Box<dyn Fn() -> Box<dyn UploadStage> + Send + Sync>;

/// Registry of stage factories, keyed by plugin name.
///
/// Read-only after initialization.
#[derive(Default)]
pub struct StageRegistry {
    factories: HashMap<String, StageFactory>,
}

impl StageRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        StageRegistry {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in stages.
    pub fn builtin() -> Self {
        let mut registry = StageRegistry::new();
        registry.register("logging", || Box::new(LoggingStage));
        registry.register("markdown_link", || Box::new(MarkdownLinkStage));
        registry.register("clipboard", || Box::new(ClipboardStage));
        registry.register("timing", || Box::new(TimingStage::new()));
        registry
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn UploadStage> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build a fresh instance of the named stage.
    pub fn build(&self, name: &str) -> Option<Box<dyn UploadStage>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Build a pipeline's worth of fresh instances, in list order.
    pub fn build_all(&self, names: &[String]) -> Result<Vec<Box<dyn UploadStage>>> {
        names
            .iter()
            .map(|name| {
                self.build(name)
                    .ok_or_else(|| Error::UnknownPlugin(name.clone()))
            })
            .collect()
    }

    /// Registered plugin names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_knows_every_stage() {
        let registry = StageRegistry::builtin();
        for name in ["logging", "markdown_link", "clipboard", "timing"] {
            assert!(registry.contains(name), "missing builtin stage {name}");
        }
        assert!(!registry.contains("watermark"));
    }

    #[test]
    fn build_returns_fresh_instances() {
        let registry = StageRegistry::builtin();
        let a = registry.build("timing").unwrap();
        let b = registry.build("timing").unwrap();
        // Two distinct boxes: per-call state never shared.
        let pa = a.as_ref() as *const dyn UploadStage as *const ();
        let pb = b.as_ref() as *const dyn UploadStage as *const ();
        assert_ne!(pa, pb);
    }

    #[test]
    fn build_all_preserves_order_and_flags_unknown_names() {
        let registry = StageRegistry::builtin();
        let stages = registry
            .build_all(&["logging".to_string(), "markdown_link".to_string()])
            .unwrap();
        assert_eq!(stages[0].name(), "logging");
        assert_eq!(stages[1].name(), "markdown_link");

        let err = registry.build_all(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownPlugin(name) if name == "nope"));
    }
}
