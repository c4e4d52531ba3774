//! Integration tests for traversals against the embedded `mem://` engine.

use codegraph_core::model::{keys, EdgeKind, NodeKind};
use codegraph_storage::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

fn props(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

async fn seeded_store() -> GraphStore {
    let store = GraphStore::memory().await.unwrap();

    let traversal = Traversal::new()
        .add_vertex(
            NodeKind::File,
            props(&[(keys::NODE_ID, json!("F1")), (keys::FILE_PATH, json!("/a.py"))]),
        )
        .add_vertex(
            NodeKind::Function,
            props(&[
                (keys::NODE_ID, json!("fn1")),
                (keys::NAME, json!("foo")),
                (keys::START_LINE, json!(1)),
                (keys::END_LINE, json!(3)),
            ]),
        )
        .add_vertex(
            NodeKind::Class,
            props(&[(keys::NODE_ID, json!("cl1")), (keys::NAME, json!("Baz"))]),
        )
        .add_edge(EdgeKind::Contains, &VertexSelection::id("F1"), &VertexSelection::id("fn1"))
        .add_edge(EdgeKind::Contains, &VertexSelection::id("F1"), &VertexSelection::id("cl1"));

    store.execute(&traversal).await.unwrap();
    store
}

fn node_ids(rows: &[Value]) -> HashSet<String> {
    rows.iter()
        .filter_map(|row| row[keys::NODE_ID].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_select_by_label() {
    let store = seeded_store().await;

    let rows: Vec<Value> = store
        .run_traversal(
            &Traversal::new().select_vertices(&VertexSelection::all().has_label(NodeKind::Function)),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][keys::NAME], json!("foo"));
    assert_eq!(rows[0][keys::LABEL], json!("Function"));
    store.close();
}

#[tokio::test]
async fn test_owner_path_is_derived_from_containing_file() {
    let store = seeded_store().await;

    let rows: Vec<Value> = store
        .run_traversal(&Traversal::new().select_vertices(&VertexSelection::id("fn1")))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][keys::OWNER_PATH], json!(["/a.py"]));
    store.close();
}

#[tokio::test]
async fn test_adjacency_in_both_directions() {
    let store = seeded_store().await;

    let outbound: Vec<Value> = store
        .run_traversal(
            &Traversal::new().select_vertices(&VertexSelection::adjacent("F1", &EdgeKind::ALL)),
        )
        .await
        .unwrap();
    assert_eq!(node_ids(&outbound), HashSet::from(["fn1".to_string(), "cl1".to_string()]));

    let inbound: Vec<Value> = store
        .run_traversal(
            &Traversal::new().select_vertices(&VertexSelection::adjacent("fn1", &EdgeKind::ALL)),
        )
        .await
        .unwrap();
    assert_eq!(node_ids(&inbound), HashSet::from(["F1".to_string()]));

    let unknown: Vec<Value> = store
        .run_traversal(
            &Traversal::new().select_vertices(&VertexSelection::adjacent("nope", &EdgeKind::ALL)),
        )
        .await
        .unwrap();
    assert!(unknown.is_empty());
    store.close();
}

#[tokio::test]
async fn test_relate_with_missing_endpoint_creates_nothing() {
    let store = seeded_store().await;

    store
        .execute(&Traversal::new().add_edge(
            EdgeKind::Contains,
            &VertexSelection::id("F1"),
            &VertexSelection::id("ghost"),
        ))
        .await
        .unwrap();

    assert_eq!(store.count_edges(EdgeKind::Contains).await.unwrap(), 2);
    store.close();
}

#[tokio::test]
async fn test_drop_removes_incident_edges() {
    let store = seeded_store().await;

    store
        .execute(&Traversal::new().drop_vertices(&VertexSelection::id("F1")))
        .await
        .unwrap();

    assert_eq!(store.count_vertices().await.unwrap(), 2);
    assert_eq!(store.count_edges(EdgeKind::Contains).await.unwrap(), 0);
    store.close();
}

#[tokio::test]
async fn test_edges_within_candidate_set() {
    let store = seeded_store().await;

    let rows: Vec<EdgeEndpoints> = store
        .run_traversal(
            &Traversal::new()
                .select_edges_within(EdgeKind::Contains, vec!["F1".to_string(), "fn1".to_string()]),
        )
        .await
        .unwrap();

    assert_eq!(
        rows,
        vec![EdgeEndpoints {
            source: "F1".to_string(),
            target: "fn1".to_string(),
        }]
    );
    store.close();
}

#[tokio::test]
async fn test_value_projection_with_limit() {
    let store = seeded_store().await;

    let ids: Vec<String> = store
        .run_traversal(&Traversal::new().select_values(
            &VertexSelection::all()
                .has_label(NodeKind::File)
                .has(keys::FILE_PATH, "/a.py"),
            keys::NODE_ID,
            Some(1),
        ))
        .await
        .unwrap();
    assert_eq!(ids, vec!["F1".to_string()]);

    let none: Vec<String> = store
        .run_traversal(&Traversal::new().select_values(
            &VertexSelection::all().has(keys::FILE_PATH, "/missing.py"),
            keys::NODE_ID,
            Some(1),
        ))
        .await
        .unwrap();
    assert!(none.is_empty());
    store.close();
}

#[tokio::test]
async fn test_unique_node_id_is_enforced() {
    let store = seeded_store().await;

    let result = store
        .execute(&Traversal::new().add_vertex(
            NodeKind::Function,
            props(&[(keys::NODE_ID, json!("fn1"))]),
        ))
        .await;

    assert!(result.unwrap_err().is_store());
    assert_eq!(store.count_vertices().await.unwrap(), 3);
    store.close();
}
