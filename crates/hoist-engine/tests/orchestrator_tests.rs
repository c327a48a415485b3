//! End-to-end orchestrator behavior over fake backends and recording stages.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use hoist_backends::{BackendArgs, BackendError, CapabilityRegistry, FnBackend, UploadBackend};
use hoist_core::{RemoteName, Settings};
use hoist_engine::{Error, Orchestrator, UploadOptions};
use hoist_plugins::{Next, PluginResult, StageRegistry, UploadStage};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn log_lines(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Capability registry with one fake capability that records every backend
/// call into `log` as `<tag>:<remote_name>` and returns
/// `https://x/<remote_name>`. The `tag` arg identifies which uploader's
/// backend instance served the call.
fn fake_capabilities(log: &Log, calls: &Arc<AtomicUsize>) -> CapabilityRegistry {
    let mut capabilities = CapabilityRegistry::new();

    let log = Arc::clone(log);
    let calls = Arc::clone(calls);
    capabilities.register("fake", move |args: &BackendArgs| {
        let tag = args.str_opt("tag").unwrap_or("untagged").to_string();
        let log = Arc::clone(&log);
        let calls = Arc::clone(&calls);
        let backend = FnBackend::new(move |req| {
            let tag = tag.clone();
            let log = Arc::clone(&log);
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                log.lock().unwrap().push(format!("{tag}:{}", req.remote_name));
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(format!("https://x/{}", req.remote_name))
            })
        });
        Ok(Arc::new(backend) as Arc<dyn UploadBackend>)
    });

    capabilities.register("failing", |_args: &BackendArgs| {
        let backend = FnBackend::new(|_req| {
            Box::pin(async move {
                Err(BackendError::UploadFailed("connection reset by peer".to_string()))
            })
        });
        Ok(Arc::new(backend) as Arc<dyn UploadBackend>)
    });

    capabilities
}

struct Recorder {
    name: String,
    log: Log,
}

#[async_trait]
impl UploadStage for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn before(&mut self, _req: &hoist_core::UploadRequest) -> PluginResult<()> {
        self.log.lock().unwrap().push(format!("{}.pre", self.name));
        Ok(())
    }

    async fn around(
        &mut self,
        req: &hoist_core::UploadRequest,
        next: Next,
    ) -> PluginResult<String> {
        self.log.lock().unwrap().push(format!("{}.around", self.name));
        next.run(req).await
    }

    async fn after(
        &mut self,
        _req: &hoist_core::UploadRequest,
        result: String,
    ) -> PluginResult<String> {
        self.log.lock().unwrap().push(format!("{}.post", self.name));
        Ok(result)
    }
}

/// Built-in stages plus a `recorder` stage wired to `log`.
fn recording_stages(log: &Log) -> StageRegistry {
    let mut stages = StageRegistry::builtin();
    let log = Arc::clone(log);
    stages.register("recorder", move || {
        Box::new(Recorder {
            name: "recorder".to_string(),
            log: Arc::clone(&log),
        })
    });
    stages
}

fn write_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"data").unwrap();
    path
}

const BASE_CONFIG: &str = r#"
    [[client]]
    name = "fake"
    capability = "fake"

    [[client]]
    name = "failing"
    capability = "failing"

    [[client]]
    name = "broken"
    capability = "does-not-exist"

    [[uploader]]
    name = "primary"
    client = "fake"
    priority = 1
    args = { tag = "primary" }

    [[uploader]]
    name = "secondary"
    client = "fake"
    priority = 5
    args = { tag = "secondary" }

    [[uploader]]
    name = "flaky"
    client = "failing"
    priority = 9

    [[uploader]]
    name = "down"
    client = "broken"
    priority = 0
"#;

fn orchestrator(config: &str, log: &Log, calls: &Arc<AtomicUsize>) -> Orchestrator {
    let settings = Settings::from_toml(config).unwrap();
    Orchestrator::from_settings(
        &settings,
        &fake_capabilities(log, calls),
        recording_stages(log),
    )
    .unwrap()
}

#[tokio::test]
async fn auto_select_prefers_priority_and_skips_unavailable() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    // "down" has the best priority but no working client.
    let orch = orchestrator(BASE_CONFIG, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.png");

    for _ in 0..3 {
        let outcome = orch
            .upload_detailed(&file, UploadOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.url, "https://x/a.png");
        assert_eq!(outcome.uploader, "primary");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Every call was served by the lowest-priority available uploader.
    assert_eq!(
        log_lines(&log),
        vec!["primary:a.png", "primary:a.png", "primary:a.png"]
    );
}

#[tokio::test]
async fn explicit_uploader_beats_everything() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);
    orch.select("primary").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.png");

    let err = orch
        .upload(
            &file,
            UploadOptions {
                uploader: Some("flaky".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    // The explicit (failing) uploader ran despite the pinned selection.
    assert!(matches!(err, Error::Upload(_)));
    assert!(err.to_string().contains("connection reset by peer"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn select_pins_across_calls() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.png");

    orch.select("secondary").unwrap();
    assert_eq!(orch.selected().as_deref(), Some("secondary"));
    for _ in 0..2 {
        let outcome = orch
            .upload_detailed(&file, UploadOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.uploader, "secondary");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // The pinned uploader's backend served both calls; "primary" would have
    // won auto-selection.
    assert_eq!(log_lines(&log), vec!["secondary:a.png", "secondary:a.png"]);

    // Pinning an unknown or unavailable uploader is rejected and leaves the
    // previous selection intact.
    assert!(matches!(orch.select("ghost"), Err(Error::UploaderNotFound(_))));
    assert!(matches!(
        orch.select("down"),
        Err(Error::UploaderNotAvailable(_))
    ));
    assert_eq!(orch.selected().as_deref(), Some("secondary"));
}

#[tokio::test]
async fn rule_routes_and_supplies_default_plugins() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let config = format!(
        "{BASE_CONFIG}
        [[rule]]
        name = \"images\"
        pattern = \"*.png\"
        uploader = \"secondary\"
        plugins = [\"recorder\", \"markdown_link\"]
        "
    );
    let orch = orchestrator(&config, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "shot.png");

    let url = orch.upload(&file, UploadOptions::default()).await.unwrap();

    // markdown_link is outermost, so it wraps the recorder's result.
    assert_eq!(url, "![](https://x/shot.png)");
    assert_eq!(
        log_lines(&log),
        vec![
            "recorder.pre",
            "recorder.around",
            "secondary:shot.png",
            "recorder.post"
        ]
    );

    // A non-matching file falls back to auto-selection with no plugins.
    log.lock().unwrap().clear();
    let other = write_file(&dir, "notes.txt");
    let url = orch.upload(&other, UploadOptions::default()).await.unwrap();
    assert_eq!(url, "https://x/notes.txt");
    assert_eq!(log_lines(&log), vec!["primary:notes.txt"]);
}

#[tokio::test]
async fn explicit_plugins_replace_rule_plugins() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let config = format!(
        "{BASE_CONFIG}
        [[rule]]
        name = \"images\"
        pattern = \"*.png\"
        uploader = \"primary\"
        plugins = [\"markdown_link\"]
        "
    );
    let orch = orchestrator(&config, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "shot.png");

    let url = orch
        .upload(
            &file,
            UploadOptions {
                plugins: Some(vec!["recorder".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // No markdown wrapping: the explicit list replaced the rule's.
    assert_eq!(url, "https://x/shot.png");
    assert_eq!(
        log_lines(&log),
        vec!["recorder.pre", "recorder.around", "primary:shot.png", "recorder.post"]
    );
}

#[tokio::test]
async fn pinned_uploader_beats_a_matching_rule() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let config = format!(
        "{BASE_CONFIG}
        [[rule]]
        name = \"images\"
        pattern = \"*.png\"
        uploader = \"primary\"
        plugins = [\"markdown_link\"]
        "
    );
    let orch = orchestrator(&config, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "shot.png");

    orch.select("secondary").unwrap();
    let outcome = orch
        .upload_detailed(&file, UploadOptions::default())
        .await
        .unwrap();

    // The pin overrides the rule's uploader, but the rule still supplies
    // the default plugin list.
    assert_eq!(outcome.uploader, "secondary");
    assert_eq!(outcome.url, "![](https://x/shot.png)");
    assert_eq!(log_lines(&log), vec!["secondary:shot.png"]);
}

#[tokio::test]
async fn unknown_plugin_fails_before_the_backend_runs() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.png");

    let err = orch
        .upload(
            &file,
            UploadOptions {
                plugins: Some(vec!["rot13".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownPlugin(name) if name == "rot13"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_is_rejected_before_any_backend_call() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);

    let err = orch
        .upload(Path::new("/no/such/file.png"), UploadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FileNotFound(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(log_lines(&log).is_empty());
}

#[tokio::test]
async fn rename_policies_resolve_through_the_orchestrator() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "My Shot.png");

    // Default: base name, spaces hyphenated.
    let url = orch.upload(&file, UploadOptions::default()).await.unwrap();
    assert_eq!(url, "https://x/My-Shot.png");

    // Literal rename, also hyphenated.
    let url = orch
        .upload(
            &file,
            UploadOptions {
                rename: RemoteName::literal("new name.png"),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(url, "https://x/new-name.png");

    // Derived rename runs exactly once.
    let derivations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&derivations);
    let url = orch
        .upload(
            &file,
            UploadOptions {
                rename: RemoteName::derived(move |path: &Path| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    format!("derived-{}", path.file_name().unwrap().to_string_lossy())
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(url, "https://x/derived-My-Shot.png");
    assert_eq!(derivations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn backend_failure_surfaces_as_one_upload_error() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.png");

    let err = orch
        .upload(
            &file,
            UploadOptions {
                uploader: Some("flaky".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload(_)));
    assert!(err.to_string().contains("connection reset by peer"));
}

#[tokio::test]
async fn uploader_lookups_distinguish_missing_and_unavailable() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let orch = orchestrator(BASE_CONFIG, &log, &calls);

    assert!(matches!(
        orch.get_uploader("ghost"),
        Err(Error::UploaderNotFound(_))
    ));
    assert!(matches!(
        orch.get_uploader("down"),
        Err(Error::UploaderNotAvailable(_))
    ));
    // Introspection still sees the unavailable uploader.
    let down = orch.lookup_uploader("down").unwrap();
    assert!(!down.available());
    assert_eq!(down.priority(), 0);
}

#[tokio::test]
async fn nothing_available_is_its_own_error() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let config = r#"
        [[client]]
        name = "broken"
        capability = "does-not-exist"

        [[uploader]]
        name = "down"
        client = "broken"
    "#;
    let orch = orchestrator(config, &log, &calls);
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "a.png");

    let err = orch.upload(&file, UploadOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::NoAvailableUploader));
}

#[tokio::test]
async fn duplicate_names_fail_construction() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let settings = Settings::from_toml(
        r#"
        [[client]]
        name = "fake"
        capability = "fake"

        [[uploader]]
        name = "dup"
        client = "fake"

        [[uploader]]
        name = "dup"
        client = "fake"
        "#,
    )
    .unwrap();

    let err = Orchestrator::from_settings(
        &settings,
        &fake_capabilities(&log, &calls),
        recording_stages(&log),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn bad_rule_references_fail_construction() {
    let (log, calls) = (new_log(), Arc::new(AtomicUsize::new(0)));
    let config = format!(
        "{BASE_CONFIG}
        [[rule]]
        name = \"bad\"
        pattern = \"*.png\"
        uploader = \"primary\"
        plugins = [\"rot13\"]
        "
    );
    let settings = Settings::from_toml(&config).unwrap();
    let err = Orchestrator::from_settings(
        &settings,
        &fake_capabilities(&log, &calls),
        recording_stages(&log),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
