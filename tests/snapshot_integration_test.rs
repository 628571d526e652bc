// End-to-end run over the file-backed bindings: a diff snapshot in, comment
// files out, idempotent across runs.

use std::fs;
use std::path::Path;

use stackdiff::bindings::{FileStore, SnapshotFile, UnifiedDiffFormatter};
use stackdiff::{Attribution, CommentPublisher, Config, RenderStyle, StageOrchestrator};

const CHANGED_SNAPSHOT: &str = r#"{
    "stacks": [
        {
            "id": "api",
            "stage": "prod",
            "diff": {
                "resources": [
                    {
                        "logical_id": "Role",
                        "old": { "type": "AWS::IAM::Role" },
                        "new": { "type": "AWS::IAM::Role" },
                        "impact": "WILL_REPLACE",
                        "changed_properties": ["RoleName"]
                    }
                ]
            }
        }
    ]
}"#;

const QUIET_SNAPSHOT: &str = r#"{
    "stacks": [
        { "id": "api", "stage": "prod", "diff": { "resources": [] } }
    ]
}"#;

async fn run_snapshot(snapshot_json: &str, snapshot_path: &Path, store: &FileStore) {
    fs::write(snapshot_path, snapshot_json).unwrap();
    let snapshot = SnapshotFile::open(snapshot_path).unwrap();
    let config = Config::default();
    let formatter = UnifiedDiffFormatter;
    let publisher = CommentPublisher::new(config.quiet_comment_policy, Attribution::new("abc1234"));
    let mut orchestrator = StageOrchestrator::new(
        &config,
        &snapshot,
        &snapshot,
        &formatter,
        publisher,
        RenderStyle::default(),
    );
    orchestrator.run(store).await.unwrap();
}

fn comment_files(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect()
}

#[tokio::test]
async fn snapshot_run_writes_one_comment_file_per_stage() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("stackdiff.snapshot.json");
    let comments_dir = dir.path().join("comments");
    let store = FileStore::new(comments_dir.clone());

    run_snapshot(CHANGED_SNAPSHOT, &snapshot_path, &store).await;

    let comments = comment_files(&comments_dir);
    assert_eq!(comments.len(), 1);
    let body = &comments[0];
    assert!(body.starts_with("<!-- stackdiff fingerprint: "));
    assert!(body.contains("Stage: `prod`"));
    assert!(body.contains("Destructive changes"));
    assert!(body.contains("WILL_REPLACE"));
    assert!(body.contains("abc1234"));
}

#[tokio::test]
async fn repeated_runs_keep_a_single_comment_file() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("stackdiff.snapshot.json");
    let comments_dir = dir.path().join("comments");
    let store = FileStore::new(comments_dir.clone());

    run_snapshot(CHANGED_SNAPSHOT, &snapshot_path, &store).await;
    run_snapshot(CHANGED_SNAPSHOT, &snapshot_path, &store).await;

    assert_eq!(comment_files(&comments_dir).len(), 1);
}

#[tokio::test]
async fn quiet_run_removes_the_stale_comment_file() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("stackdiff.snapshot.json");
    let comments_dir = dir.path().join("comments");
    let store = FileStore::new(comments_dir.clone());

    run_snapshot(CHANGED_SNAPSHOT, &snapshot_path, &store).await;
    run_snapshot(QUIET_SNAPSHOT, &snapshot_path, &store).await;

    assert!(comment_files(&comments_dir).is_empty());
}
