//! End-to-end batches against the real filesystem.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use fileops_core::{
    orchestrator::SkipReason,
    parse_batch_json,
    testing::fixtures::path_pair,
    BatchOrchestrator, Command, CommandBatch, CommandOutcome, CommandSpec, EngineConfig,
    ExecutorConfig, FingerprintStore, FsExecutor, Job, MemoryFingerprintStore, OptionSet,
};

fn orchestrator(store: Arc<MemoryFingerprintStore>) -> BatchOrchestrator {
    BatchOrchestrator::new(
        EngineConfig::default(),
        Arc::new(FsExecutor::new(ExecutorConfig::default())),
        store as Arc<dyn FingerprintStore>,
    )
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn test_archive_pipeline() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("site/index.html"), "<h1>hi</h1>");
    write(&root.join("site/css/main.css"), "body {}");

    let batch = CommandBatch::new()
        .with(
            "copy",
            CommandSpec::new(vec![path_pair(root.join("site"), root.join("staging"))]),
        )
        .with(
            "zip",
            CommandSpec::new(vec![path_pair(root.join("staging"), root.join("out/site.zip"))]),
        )
        .with(
            "unzip",
            CommandSpec::new(vec![path_pair(root.join("out/site.zip"), root.join("restored"))]),
        )
        .with(
            "del",
            CommandSpec::new(vec![Job::from(root.join("staging").to_str().unwrap())]),
        );

    let store = Arc::new(MemoryFingerprintStore::new());
    let report = orchestrator(Arc::clone(&store))
        .run(&batch, &OptionSet::default())
        .await
        .unwrap();

    assert_eq!(report.total_completed(), 4);
    assert!(!root.join("staging").exists());
    assert!(root.join("site/index.html").exists());
    assert_eq!(
        fs::read_to_string(root.join("restored/css/main.css")).unwrap(),
        "body {}"
    );
    assert_eq!(
        fs::read_to_string(root.join("restored/index.html")).unwrap(),
        "<h1>hi</h1>"
    );
}

#[tokio::test]
async fn test_parallel_copies_from_json_batch() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let mut items = Vec::new();
    for i in 0..6 {
        let source = root.join(format!("in/{i}.txt"));
        write(&source, &format!("file {i}"));
        items.push(serde_json::json!({
            "src": source,
            "dest": root.join(format!("out/{i}.txt")),
        }));
    }

    let document = serde_json::json!({
        "copy": {"items": items, "options": {"parallel": 3}},
        "touch": {"items": ["ignored"]},
    });
    let batch = parse_batch_json(&document.to_string()).unwrap();

    let report = orchestrator(Arc::new(MemoryFingerprintStore::new()))
        .run(&batch, &OptionSet::default())
        .await
        .unwrap();

    assert_eq!(report.ignored, vec!["touch".to_string()]);
    for i in 0..6 {
        assert_eq!(
            fs::read_to_string(root.join(format!("out/{i}.txt"))).unwrap(),
            format!("file {i}")
        );
    }
}

#[tokio::test]
async fn test_unchanged_batch_is_not_rerun() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.txt"), "a");
    let batch = CommandBatch::new().with(
        "rename",
        CommandSpec::new(vec![path_pair(root.join("a.txt"), root.join("b.txt"))]),
    );

    let store = Arc::new(MemoryFingerprintStore::new());
    let orchestrator = orchestrator(Arc::clone(&store));
    orchestrator.run(&batch, &OptionSet::default()).await.unwrap();
    assert!(root.join("b.txt").exists());

    // The source is gone, so a real rerun would fail.
    let report = orchestrator.run(&batch, &OptionSet::default()).await.unwrap();
    assert_eq!(
        report.outcome(Command::Rename),
        Some(&CommandOutcome::Skipped {
            reason: SkipReason::Unchanged
        })
    );

    let err = orchestrator
        .run(&batch, &OptionSet::new().with_cache(false))
        .await
        .unwrap_err();
    assert_eq!(err.command(), Some(Command::Rename));
}

#[tokio::test]
async fn test_move_failure_keeps_earlier_moves() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("one.txt"), "1");
    write(&root.join("three.txt"), "3");

    let batch = CommandBatch::new().with(
        "move",
        CommandSpec::new(vec![
            path_pair(root.join("one.txt"), root.join("moved/one.txt")),
            path_pair(root.join("two.txt"), root.join("moved/two.txt")),
            path_pair(root.join("three.txt"), root.join("moved/three.txt")),
        ]),
    );

    let store = Arc::new(MemoryFingerprintStore::new());
    let err = orchestrator(Arc::clone(&store))
        .run(&batch, &OptionSet::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("move failed at item #1"));
    assert!(root.join("moved/one.txt").exists());
    assert!(root.join("three.txt").exists());
    assert_eq!(store.get(Command::Move), None);
}
