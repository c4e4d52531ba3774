//! Store-backed `GraphQueryService` over SurrealDB.

use crate::flatten::{file_record, member_record, node_from_record};
use crate::locks::IngestLocks;
use async_trait::async_trait;
use codegraph_core::error::{CodeGraphError, Result};
use codegraph_core::model::*;
use codegraph_core::traits::GraphQueryService;
use codegraph_storage::{EdgeEndpoints, GraphStore, Traversal, VertexSelection};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Graph query service backed by a `GraphStore`.
#[derive(Clone)]
pub struct SurrealGraphService {
    store: Arc<GraphStore>,
    locks: Arc<IngestLocks>,
}

impl SurrealGraphService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store,
            locks: Arc::new(IngestLocks::new()),
        }
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Drop any node with this id. Failures are logged and swallowed; the
    /// insert that follows reports anything that still blocks it.
    async fn drop_node(&self, node_id: &str) {
        if let Err(e) = self
            .store
            .execute(&Traversal::new().drop_vertices(&VertexSelection::id(node_id)))
            .await
        {
            warn!(node_id, error = %e, "Failed to drop previous node version");
        }
    }

    /// Drop any node with this id, then insert the new one together with its
    /// CONTAINS edges in one round-trip: from `parent` when given, and to each
    /// of `children` that exists.
    async fn replace_node(
        &self,
        node_id: &str,
        kind: NodeKind,
        record: Map<String, Value>,
        parent: Option<&str>,
        children: &[String],
    ) -> Result<()> {
        self.drop_node(node_id).await;

        let selection = VertexSelection::id(node_id);
        let mut traversal = Traversal::new().add_vertex(kind, record);
        if let Some(parent) = parent {
            traversal =
                traversal.add_edge(EdgeKind::Contains, &VertexSelection::id(parent), &selection);
        }
        for child in children {
            traversal = traversal.add_edge(
                EdgeKind::Contains,
                &selection,
                &VertexSelection::id(child.as_str()),
            );
        }

        self.store.execute(&traversal).await.map_err(|e| {
            CodeGraphError::store(format!("Failed to write {} {}: {}", kind, node_id, e))
        })
    }

    async fn child_ids(&self, file_id: &str) -> Result<Vec<String>> {
        self.node_ids(
            &VertexSelection::all().target_of(EdgeKind::Contains, file_id),
            None,
        )
        .await
    }

    async fn node_ids(&self, selection: &VertexSelection, limit: Option<usize>) -> Result<Vec<String>> {
        self.store
            .run_traversal(&Traversal::new().select_values(selection, keys::NODE_ID, limit))
            .await
    }

    async fn select_nodes(&self, selection: &VertexSelection) -> Result<Vec<GraphNodeData>> {
        let records: Vec<RawRecord> = self
            .store
            .run_traversal(&Traversal::new().select_vertices(selection))
            .await?;
        records.into_iter().map(node_from_record).collect()
    }
}

#[async_trait]
impl GraphQueryService for SurrealGraphService {
    async fn ingest_parsed_code(&self, parsed: &ParsedCodeModel) -> Result<()> {
        parsed.validate()?;
        let file = &parsed.file;
        let written: Vec<&str> = std::iter::once(file.id.as_str())
            .chain(parsed.members().map(|(_, member)| member.id.as_str()))
            .collect();

        // Previous children are re-linked, so they are written too and must be
        // locked. Another file may claim one of them before our locks are in
        // place; retry until the children read under the locks are all held.
        let mut seen_children = self.child_ids(&file.id).await?;
        let (_guard, prior_children) = loop {
            let guard = self
                .locks
                .acquire(
                    &file.file_path,
                    written
                        .iter()
                        .copied()
                        .chain(seen_children.iter().map(String::as_str)),
                )
                .await;
            let children = self.child_ids(&file.id).await?;
            if children.iter().all(|child| guard.holds_node(child)) {
                break (guard, children);
            }
            debug!(file_id = %file.id, "Children changed before locking, retrying");
            drop(guard);
            seen_children = children;
        };

        let owners = self
            .node_ids(
                &VertexSelection::all()
                    .has_label(NodeKind::File)
                    .has(keys::FILE_PATH, file.file_path.as_str()),
                None,
            )
            .await?;
        if let Some(existing) = owners.into_iter().find(|owner| owner != &file.id) {
            return Err(CodeGraphError::path_conflict(&file.file_path, existing));
        }

        // Children re-linked here stay attached even if a member write fails.
        self.replace_node(&file.id, NodeKind::File, file_record(file), None, &prior_children)
            .await?;
        if !prior_children.is_empty() {
            debug!(file_id = %file.id, count = prior_children.len(), "Re-linked previous children");
        }

        for (kind, member) in parsed.members() {
            self.replace_node(&member.id, kind, member_record(member), Some(&file.id), &[])
                .await?;
        }

        info!(
            file_id = %file.id,
            file_path = %file.file_path,
            functions = parsed.functions.len(),
            classes = parsed.classes.len(),
            "Ingested parsed code"
        );
        Ok(())
    }

    async fn get_all_nodes(&self, node_type: Option<NodeKind>) -> Result<Vec<GraphNodeData>> {
        let selection = match node_type {
            Some(kind) => VertexSelection::all().has_label(kind),
            None => VertexSelection::all(),
        };
        self.select_nodes(&selection).await
    }

    async fn get_connected_nodes(
        &self,
        node_id: &str,
        edge_type: Option<EdgeKind>,
    ) -> Result<Vec<GraphNodeData>> {
        let edges = match edge_type {
            Some(kind) => vec![kind],
            None => EdgeKind::ALL.to_vec(),
        };
        self.select_nodes(&VertexSelection::adjacent(node_id, &edges))
            .await
    }

    async fn get_code_graph_snapshot(&self, file_path: &str) -> Result<GraphSnapshot> {
        let file_id = match self
            .node_ids(
                &VertexSelection::all()
                    .has_label(NodeKind::File)
                    .has(keys::FILE_PATH, file_path),
                Some(1),
            )
            .await?
            .into_iter()
            .next()
        {
            Some(id) => id,
            None => {
                debug!(file_path, "No file node for snapshot");
                return Ok(GraphSnapshot::empty());
            }
        };

        let nodes = self
            .select_nodes(&VertexSelection::any_of(vec![
                VertexSelection::id(file_id.as_str()),
                VertexSelection::all().target_of(EdgeKind::Contains, file_id.as_str()),
            ]))
            .await?;

        let ids: Vec<String> = nodes.iter().map(|node| node.id.clone()).collect();
        let endpoints: Vec<EdgeEndpoints> = self
            .store
            .run_traversal(&Traversal::new().select_edges_within(EdgeKind::Contains, ids))
            .await?;

        let edges = endpoints
            .into_iter()
            .map(|edge| GraphEdgeData::contains(edge.source, edge.target))
            .collect();

        Ok(GraphSnapshot { nodes, edges })
    }

    async fn stats(&self) -> Result<GraphStats> {
        let nodes = self.store.count_vertices().await?;
        let mut edges = 0;
        for kind in EdgeKind::ALL {
            edges += self.store.count_edges(kind).await?;
        }
        Ok(GraphStats { nodes, edges })
    }

    async fn clear(&self) -> Result<()> {
        self.store.clear_all().await
    }

    async fn close(&self) -> Result<()> {
        self.store.close();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }
}
