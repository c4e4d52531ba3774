//! Parsing of parser payloads and configuration files from disk.

use codegraph_core::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const PAYLOAD: &str = r#"{
    "file": {"id": "F1", "filePath": "/a.py", "language": "python"},
    "functions": [
        {"id": "fn1", "name": "foo", "fileId": "F1", "startLine": 1, "endLine": 3,
         "properties": {"async": true}},
        {"id": "fn2", "name": "bar", "fileId": "F1", "startLine": 5, "endLine": 8}
    ],
    "classes": [
        {"id": "cl1", "name": "Baz", "fileId": "F1", "startLine": 10, "endLine": 20}
    ]
}"#;

#[tokio::test]
async fn test_payload_from_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PAYLOAD.as_bytes()).unwrap();

    let parsed = ParsedCodeModel::from_path(file.path()).await.unwrap();
    parsed.validate().unwrap();

    assert_eq!(parsed.file.file_path, "/a.py");
    assert_eq!(parsed.node_count(), 4);
    assert_eq!(parsed.functions[0].properties["async"], serde_json::json!(true));
    assert!(parsed.classes[0].properties.is_empty());

    let kinds: Vec<NodeKind> = parsed.members().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![NodeKind::Function, NodeKind::Function, NodeKind::Class]);
}

#[test]
fn test_payload_without_members() {
    let parsed =
        ParsedCodeModel::from_json(r#"{"file": {"id": "F1", "filePath": "/empty.py"}}"#).unwrap();
    parsed.validate().unwrap();
    assert_eq!(parsed.file.language, "");
    assert_eq!(parsed.node_count(), 1);
}

#[tokio::test]
async fn test_missing_payload_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ParsedCodeModel::from_path(&dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, CodeGraphError::Io(_)));
}

#[test]
fn test_malformed_payload_is_serialization_error() {
    let err = ParsedCodeModel::from_json(r#"{"file": {"id": 1}}"#).unwrap_err();
    assert!(matches!(err, CodeGraphError::Serialization(_)));
}

#[tokio::test]
async fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("codegraph.toml");

    let mut config = CodeGraphConfig::in_memory();
    config.service.backend = ServiceBackend::Reference;
    config.store.query_timeout_secs = Some(5);
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = CodeGraphConfig::load_from_path(&path).await.unwrap();
    assert!(loaded.store.use_in_memory);
    assert_eq!(loaded.service.backend, ServiceBackend::Reference);
    assert_eq!(loaded.store.query_timeout_secs, Some(5));
}

#[tokio::test]
async fn test_invalid_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("codegraph.toml");
    std::fs::write(&path, "[store]\nquery_timeout_secs = 0\n").unwrap();

    let err = CodeGraphConfig::load_from_path(&path).await.unwrap_err();
    assert!(matches!(err, CodeGraphError::Config(_)));
}
