//! Per-call upload request types
//!
//! An [`UploadRequest`] is what backends see: the local path, the fully
//! resolved remote name, and an opaque string option map passed through from
//! the caller. Remote-name resolution lives here so every backend gets the
//! same semantics.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// How the remote name for an upload is chosen.
pub enum RemoteName {
    /// Use the local file's base name.
    Default,
    /// Use this name verbatim.
    Literal(String),
    /// Derive the name from the local path. Invoked exactly once per call.
    Derived(Box<dyn Fn(&Path) -> String + Send + Sync>),
}

impl RemoteName {
    pub fn literal(name: impl Into<String>) -> Self {
        RemoteName::Literal(name.into())
    }

    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Path) -> String + Send + Sync + 'static,
    {
        RemoteName::Derived(Box::new(f))
    }

    /// Resolve the remote name for `path`. Space characters are replaced
    /// with hyphens exactly once, after resolution.
    pub fn resolve(&self, path: &Path) -> String {
        let name = match self {
            RemoteName::Default => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            RemoteName::Literal(name) => name.clone(),
            RemoteName::Derived(f) => f(path),
        };
        name.replace(' ', "-")
    }
}

impl Default for RemoteName {
    fn default() -> Self {
        RemoteName::Default
    }
}

impl fmt::Debug for RemoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteName::Default => f.write_str("RemoteName::Default"),
            RemoteName::Literal(name) => write!(f, "RemoteName::Literal({name:?})"),
            RemoteName::Derived(_) => f.write_str("RemoteName::Derived(..)"),
        }
    }
}

/// One upload call as seen by a backend.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Local file to upload. Validated to exist before any backend runs.
    pub path: PathBuf,
    /// Fully resolved remote name (no spaces).
    pub remote_name: String,
    /// Opaque backend options passed through from the caller. Backends parse
    /// what they understand and ignore the rest.
    pub options: BTreeMap<String, String>,
}

impl UploadRequest {
    pub fn new(path: impl Into<PathBuf>, remote_name: impl Into<String>) -> Self {
        UploadRequest {
            path: path.into(),
            remote_name: remote_name.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    /// Look up a boolean option; anything except "false"/"no"/"0" is true.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.options.get(key) {
            Some(v) => !matches!(v.as_str(), "false" | "no" | "0"),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn default_uses_base_name() {
        let name = RemoteName::Default.resolve(Path::new("/some/dir/photo.png"));
        assert_eq!(name, "photo.png");
    }

    #[test]
    fn literal_spaces_become_hyphens() {
        let name = RemoteName::literal("My File.png").resolve(Path::new("/x/y.png"));
        assert_eq!(name, "My-File.png");
        assert!(!name.contains(' '));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn derived_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let rename = RemoteName::derived(move |path: &Path| {
            counter.fetch_add(1, Ordering::SeqCst);
            path.file_name().unwrap().to_string_lossy().to_uppercase()
        });

        let name = rename.resolve(Path::new("/pics/photo.JPG"));
        assert_eq!(name, "PHOTO.JPG");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn flag_parsing() {
        let mut options = BTreeMap::new();
        options.insert("overwrite".to_string(), "false".to_string());
        options.insert("cdn".to_string(), "true".to_string());
        let req = UploadRequest::new("/tmp/a.png", "a.png").with_options(options);

        assert!(!req.flag("overwrite", true));
        assert!(req.flag("cdn", false));
        assert!(req.flag("missing", true));
        assert!(!req.flag("missing", false));
    }
}
