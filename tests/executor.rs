//! Tool executor integration tests
//!
//! Batches against real file tools and spy tools: ordering, permission
//! checks and fault isolation.

mod common;

use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use bob::core::ToolCall;
use bob::tools::implementations::ReadTool;
use bob::tools::path_utils::ReadTracker;
use bob::tools::{Permission, PermissionSet, SharedPermissions, ToolExecutor, ToolRegistry};

use common::{PanickingTool, SpyTool};

fn file_permissions() -> SharedPermissions {
    SharedPermissions::new(PermissionSet::default().with(Permission::FileOperations, true))
}

#[tokio::test]
async fn test_mixed_batch_keeps_order_and_isolates_failure() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

    let registry = ToolRegistry::new().with(Arc::new(ReadTool::new(ReadTracker::new())));
    let executor = ToolExecutor::new(registry, file_permissions(), dir.path());

    let calls = vec![
        ToolCall::new("1", "read", json!({"file_path": "a.txt"})),
        ToolCall::new("2", "read", json!({"file_path": "missing.txt"})),
    ];
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].tool_call_id, "1");
    assert!(results[0].success);
    assert!(results[0].output.contains("hello"));

    assert_eq!(results[1].tool_call_id, "2");
    assert!(!results[1].success);
    assert!(results[1].output.contains("File not found"));
}

#[tokio::test]
async fn test_denied_tool_never_runs() {
    let spy = SpyTool::new("bash").requiring(Permission::ShellCommands);
    let counter = spy.counter();
    let registry = ToolRegistry::new().with(Arc::new(spy));
    let executor = ToolExecutor::new(registry, file_permissions(), std::env::temp_dir());

    let calls = vec![ToolCall::new("1", "bash", json!({"value": "ls"}))];
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    assert!(!results[0].success);
    assert!(results[0].output.contains("operation not permitted"));
    assert!(results[0].output.contains("allow_shell_commands"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_permission_change_applies_to_next_batch() {
    let spy = SpyTool::new("bash").requiring(Permission::ShellCommands);
    let counter = spy.counter();
    let permissions = file_permissions();
    let executor = ToolExecutor::new(
        ToolRegistry::new().with(Arc::new(spy)),
        permissions.clone(),
        std::env::temp_dir(),
    );
    let calls = vec![ToolCall::new("1", "bash", json!({}))];

    let denied = executor.execute(&calls, &CancellationToken::new()).await;
    assert!(!denied[0].success);

    permissions.set(Permission::ShellCommands, true).await;
    let allowed = executor.execute(&calls, &CancellationToken::new()).await;
    assert!(allowed[0].success);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_tool_is_a_failure_result() {
    let executor = ToolExecutor::new(ToolRegistry::new(), file_permissions(), std::env::temp_dir());

    let calls = vec![ToolCall::new("1", "teleport", json!({}))];
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].tool_name, "teleport");
    assert!(results[0].output.contains("Unknown tool 'teleport'"));
}

#[tokio::test]
async fn test_panicking_tool_does_not_affect_siblings() {
    let registry = ToolRegistry::new()
        .with(Arc::new(PanickingTool))
        .with(Arc::new(SpyTool::new("echo")));
    let executor = ToolExecutor::new(registry, file_permissions(), std::env::temp_dir());

    let calls = vec![
        ToolCall::new("1", "explode", json!({})),
        ToolCall::new("2", "echo", json!({"value": "still here"})),
    ];
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    assert!(!results[0].success);
    assert!(results[1].success);
    assert_eq!(results[1].output, "echo:still here");
}

#[tokio::test]
async fn test_malformed_arguments_are_rejected() {
    let spy = SpyTool::new("echo");
    let counter = spy.counter();
    let executor = ToolExecutor::new(
        ToolRegistry::new().with(Arc::new(spy)),
        file_permissions(),
        std::env::temp_dir(),
    );

    let calls = vec![
        ToolCall::new("1", "echo", Value::String("{not json".to_string())),
        ToolCall::new("2", "echo", json!([1, 2, 3])),
        ToolCall::new("3", "echo", Value::String(r#"{"value": "ok"}"#.to_string())),
    ];
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    assert!(results[0].output.contains("Invalid arguments"));
    assert!(results[1].output.contains("Invalid arguments"));
    assert!(results[2].success);
    assert_eq!(results[2].output, "echo:ok");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_schema_mismatch_never_reaches_tool_body() {
    let spy = SpyTool::new("open").with_schema(json!({
        "type": "object",
        "properties": {"path": {"type": "string"}},
        "required": ["path"],
        "additionalProperties": false
    }));
    let counter = spy.counter();
    let executor = ToolExecutor::new(
        ToolRegistry::new().with(Arc::new(spy)),
        file_permissions(),
        std::env::temp_dir(),
    );

    let calls = vec![
        ToolCall::new("1", "open", json!({"path": 42})),
        ToolCall::new("2", "open", json!({})),
        ToolCall::new("3", "open", json!({"path": "a.txt", "mode": "w"})),
    ];
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    for result in &results {
        assert!(!result.success);
        assert!(result.output.contains("Invalid arguments"), "{}", result.output);
    }
    assert!(results[0].output.contains("arguments.path: expected string, got integer"));
    assert!(results[1].output.contains("missing required property 'path'"));
    assert!(results[2].output.contains("unexpected property 'mode'"));
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let ok = executor
        .execute(&[ToolCall::new("4", "open", json!({"path": "a.txt"}))], &CancellationToken::new())
        .await;
    assert!(ok[0].success);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_batch_runs_concurrently() {
    let registry = ToolRegistry::new()
        .with(Arc::new(SpyTool::new("a").with_delay(Duration::from_millis(200))))
        .with(Arc::new(SpyTool::new("b").with_delay(Duration::from_millis(200))))
        .with(Arc::new(SpyTool::new("c").with_delay(Duration::from_millis(200))));
    let executor = ToolExecutor::new(registry, file_permissions(), std::env::temp_dir());

    let calls = vec![
        ToolCall::new("1", "a", json!({})),
        ToolCall::new("2", "b", json!({})),
        ToolCall::new("3", "c", json!({})),
    ];
    let started = std::time::Instant::now();
    let results = executor.execute(&calls, &CancellationToken::new()).await;

    assert!(results.iter().all(|r| r.success));
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[tokio::test]
async fn test_repeated_batch_gives_same_results() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# Notes\n").unwrap();
    let executor = ToolExecutor::new(
        ToolRegistry::new().with(Arc::new(ReadTool::new(ReadTracker::new()))),
        file_permissions(),
        dir.path(),
    );
    let calls = vec![ToolCall::new("1", "read", json!({"file_path": "notes.md"}))];

    let first = executor.execute(&calls, &CancellationToken::new()).await;
    let second = executor.execute(&calls, &CancellationToken::new()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_batch() {
    let executor = ToolExecutor::new(ToolRegistry::new(), file_permissions(), std::env::temp_dir());
    assert!(executor.execute(&[], &CancellationToken::new()).await.is_empty());
}
