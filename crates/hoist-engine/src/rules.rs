//! Filename-based routing rules
//!
//! Rules are declared glob patterns matched against the bare file name of
//! the local path, in declaration order; the first match wins. Patterns,
//! uploader references and plugin lists are validated at construction so a
//! bad rule fails the whole configuration rather than a later upload.

use std::path::Path;

use glob::Pattern;

use hoist_core::{Error, Result, RuleConfig};
use hoist_plugins::StageRegistry;

use crate::uploaders::UploaderRegistry;

/// One compiled routing rule.
pub struct UploadRule {
    name: String,
    pattern: Pattern,
    uploader: String,
    plugins: Vec<String>,
}

impl UploadRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uploader(&self) -> &str {
        &self.uploader
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Match against the file name component only, never the full path.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.pattern.matches(name))
    }
}

/// Ordered rule list with first-match semantics.
#[derive(Default)]
pub struct RuleMatcher {
    rules: Vec<UploadRule>,
}

impl std::fmt::Debug for RuleMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleMatcher").finish_non_exhaustive()
    }
}

impl RuleMatcher {
    pub fn new() -> Self {
        RuleMatcher { rules: Vec::new() }
    }

    /// Compile and validate the `[[rule]]` section.
    pub fn from_config(
        configs: &[RuleConfig],
        uploaders: &UploaderRegistry,
        stages: &StageRegistry,
    ) -> Result<Self> {
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            let pattern = Pattern::new(&config.pattern).map_err(|err| {
                Error::Config(format!(
                    "rule `{}` has invalid pattern `{}`: {err}",
                    config.name, config.pattern
                ))
            })?;
            if !uploaders.contains(&config.uploader) {
                return Err(Error::Config(format!(
                    "rule `{}` references unknown uploader `{}`",
                    config.name, config.uploader
                )));
            }
            for plugin in &config.plugins {
                if !stages.contains(plugin) {
                    return Err(Error::Config(format!(
                        "rule `{}` references unknown plugin `{plugin}`",
                        config.name
                    )));
                }
            }
            rules.push(UploadRule {
                name: config.name.clone(),
                pattern,
                uploader: config.uploader.clone(),
                plugins: config.plugins.clone(),
            });
        }
        Ok(RuleMatcher { rules })
    }

    /// First rule whose pattern matches the path's file name.
    pub fn first_match(&self, path: &Path) -> Option<&UploadRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use hoist_backends::{CapabilityRegistry, FnBackend, UploadBackend};
    use hoist_core::{ClientConfig, UploaderConfig};

    use crate::clients::ClientRegistry;

    fn uploaders() -> UploaderRegistry {
        let mut capabilities = CapabilityRegistry::new();
        capabilities.register("fake", |_args: &hoist_backends::BackendArgs| {
            let backend =
                FnBackend::new(|_req| Box::pin(async move { Ok("fake://x".to_string()) }));
            Ok(Arc::new(backend) as Arc<dyn UploadBackend>)
        });
        let clients = ClientRegistry::from_config(
            &[ClientConfig {
                name: "fake".to_string(),
                capability: "fake".to_string(),
                args: BTreeMap::new(),
            }],
            &capabilities,
        )
        .unwrap();
        UploaderRegistry::from_config(
            &[
                UploaderConfig {
                    name: "images".to_string(),
                    client: Some("fake".to_string()),
                    priority: 1,
                    args: BTreeMap::new(),
                },
                UploaderConfig {
                    name: "docs".to_string(),
                    client: Some("fake".to_string()),
                    priority: 2,
                    args: BTreeMap::new(),
                },
            ],
            &clients,
        )
        .unwrap()
    }

    fn rule(name: &str, pattern: &str, uploader: &str, plugins: &[&str]) -> RuleConfig {
        RuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            uploader: uploader.to_string(),
            plugins: plugins.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn first_match_wins_in_declaration_order() {
        let matcher = RuleMatcher::from_config(
            &[
                rule("pngs", "*.png", "images", &[]),
                rule("any-image", "*.*", "docs", &[]),
            ],
            &uploaders(),
            &StageRegistry::builtin(),
        )
        .unwrap();

        let matched = matcher.first_match(Path::new("/photos/cat.png")).unwrap();
        assert_eq!(matched.name(), "pngs");
        assert_eq!(matched.uploader(), "images");

        let fallback = matcher.first_match(Path::new("notes.txt")).unwrap();
        assert_eq!(fallback.name(), "any-image");
    }

    #[test]
    fn matching_uses_the_file_name_not_the_path() {
        let matcher = RuleMatcher::from_config(
            &[rule("pngs", "*.png", "images", &[])],
            &uploaders(),
            &StageRegistry::builtin(),
        )
        .unwrap();
        // The directory component would also match `*.png` as a substring
        // of the path; only the final component counts.
        assert!(matcher.first_match(Path::new("/a.png/readme.txt")).is_none());
    }

    #[test]
    fn no_rule_matches() {
        let matcher = RuleMatcher::from_config(
            &[rule("pngs", "*.png", "images", &[])],
            &uploaders(),
            &StageRegistry::builtin(),
        )
        .unwrap();
        assert!(matcher.first_match(Path::new("video.mp4")).is_none());
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = RuleMatcher::from_config(
            &[rule("bad", "[unclosed", "images", &[])],
            &uploaders(),
            &StageRegistry::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_uploader_is_a_config_error() {
        let err = RuleMatcher::from_config(
            &[rule("bad", "*.png", "missing", &[])],
            &uploaders(),
            &StageRegistry::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_plugin_is_a_config_error() {
        let err = RuleMatcher::from_config(
            &[rule("bad", "*.png", "images", &["rot13"])],
            &uploaders(),
            &StageRegistry::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("rot13"));
    }
}
