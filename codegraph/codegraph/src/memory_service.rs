//! In-memory reference implementation of `GraphQueryService`.
//!
//! Holds the graph in plain maps and answers every query structurally. It
//! stores the same records as the SurrealDB service and reads them back
//! through the same `node_from_record`, so both agree on membership and shape.

use crate::flatten::{file_record, member_record, node_from_record};
use async_trait::async_trait;
use codegraph_core::error::{CodeGraphError, Result};
use codegraph_core::model::*;
use codegraph_core::traits::GraphQueryService;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

type StoredNode = Map<String, Value>;

#[derive(Debug, Default)]
struct GraphState {
    nodes: BTreeMap<String, StoredNode>,
    edges: Vec<GraphEdgeData>,
}

impl GraphState {
    fn label_of(&self, node_id: &str) -> Option<&str> {
        self.nodes
            .get(node_id)
            .and_then(|record| record.get(keys::LABEL))
            .and_then(Value::as_str)
    }

    fn file_ids_with_path<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = &'a String> {
        self.nodes.iter().filter_map(move |(id, record)| {
            let is_file = record.get(keys::LABEL).and_then(Value::as_str)
                == Some(NodeKind::File.label());
            let same_path = record.get(keys::FILE_PATH).and_then(Value::as_str) == Some(file_path);
            (is_file && same_path).then_some(id)
        })
    }

    fn targets_of(&self, source_id: &str, kind: EdgeKind) -> Vec<String> {
        self.edges
            .iter()
            .filter(|edge| edge.edge_type == kind && edge.source_id == source_id)
            .map(|edge| edge.target_id.clone())
            .collect()
    }

    /// Remove a node and every edge touching it
    fn drop_node(&mut self, node_id: &str) {
        self.edges
            .retain(|edge| edge.source_id != node_id && edge.target_id != node_id);
        self.nodes.remove(node_id);
    }

    fn insert_node(&mut self, kind: NodeKind, mut record: StoredNode) {
        record.insert(keys::LABEL.to_string(), kind.label().into());
        let id = record
            .get(keys::NODE_ID)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.nodes.insert(id, record);
    }

    /// Add an edge if both endpoints exist and it is not already present
    fn relate(&mut self, kind: EdgeKind, source_id: &str, target_id: &str) {
        if !self.nodes.contains_key(source_id) || !self.nodes.contains_key(target_id) {
            return;
        }
        let exists = self.edges.iter().any(|edge| {
            edge.edge_type == kind && edge.source_id == source_id && edge.target_id == target_id
        });
        if !exists {
            self.edges.push(GraphEdgeData::new(source_id, target_id, kind));
        }
    }

    /// Build the returned node, deriving `ownerPath` from containing Files
    fn node(&self, node_id: &str) -> Result<GraphNodeData> {
        let record = self
            .nodes
            .get(node_id)
            .ok_or_else(|| CodeGraphError::internal(format!("Node {} vanished", node_id)))?;

        let owners: Vec<Value> = self
            .edges
            .iter()
            .filter(|edge| edge.edge_type == EdgeKind::Contains && edge.target_id == node_id)
            .filter_map(|edge| self.nodes.get(&edge.source_id))
            .filter_map(|source| source.get(keys::FILE_PATH).cloned())
            .collect();

        let mut raw: RawRecord = record
            .iter()
            .map(|(key, value)| (key.clone(), PropertyValue::from(value.clone())))
            .collect();
        raw.insert(keys::OWNER_PATH.to_string(), PropertyValue::Many(owners));

        node_from_record(raw)
    }

    fn collect_nodes<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Result<Vec<GraphNodeData>> {
        ids.into_iter().map(|id| self.node(id)).collect()
    }
}

/// Graph query service over owned in-process maps.
#[derive(Debug)]
pub struct MemoryGraphService {
    state: RwLock<GraphState>,
}

impl MemoryGraphService {
    pub fn new() -> Self {
        info!("Reference graph service initialized");
        Self {
            state: RwLock::new(GraphState::default()),
        }
    }
}

impl Default for MemoryGraphService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphQueryService for MemoryGraphService {
    async fn ingest_parsed_code(&self, parsed: &ParsedCodeModel) -> Result<()> {
        parsed.validate()?;
        let file = &parsed.file;
        let mut state = self.state.write();

        if let Some(existing) = state
            .file_ids_with_path(&file.file_path)
            .find(|owner| *owner != &file.id)
        {
            return Err(CodeGraphError::path_conflict(&file.file_path, existing.clone()));
        }

        let prior_children = state.targets_of(&file.id, EdgeKind::Contains);

        state.drop_node(&file.id);
        state.insert_node(NodeKind::File, file_record(file));
        for child in &prior_children {
            state.relate(EdgeKind::Contains, &file.id, child);
        }

        for (kind, member) in parsed.members() {
            state.drop_node(&member.id);
            state.insert_node(kind, member_record(member));
            state.relate(EdgeKind::Contains, &file.id, &member.id);
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
        let state = self.state.read();
        let ids: Vec<&String> = state
            .nodes
            .keys()
            .filter(|id| match node_type {
                Some(kind) => state.label_of(id) == Some(kind.label()),
                None => true,
            })
            .collect();
        state.collect_nodes(ids)
    }

    async fn get_connected_nodes(
        &self,
        node_id: &str,
        edge_type: Option<EdgeKind>,
    ) -> Result<Vec<GraphNodeData>> {
        let state = self.state.read();
        let neighbours: BTreeSet<&String> = state
            .edges
            .iter()
            .filter(|edge| edge_type.is_none_or(|kind| edge.edge_type == kind))
            .filter_map(|edge| {
                if edge.source_id == node_id {
                    Some(&edge.target_id)
                } else if edge.target_id == node_id {
                    Some(&edge.source_id)
                } else {
                    None
                }
            })
            .collect();
        state.collect_nodes(neighbours)
    }

    async fn get_code_graph_snapshot(&self, file_path: &str) -> Result<GraphSnapshot> {
        let state = self.state.read();
        let Some(file_id) = state.file_ids_with_path(file_path).next().cloned() else {
            debug!(file_path, "No file node for snapshot");
            return Ok(GraphSnapshot::empty());
        };

        let mut members: BTreeSet<String> = state
            .targets_of(&file_id, EdgeKind::Contains)
            .into_iter()
            .collect();
        members.insert(file_id);

        let nodes = state.collect_nodes(&members)?;
        let edges = state
            .edges
            .iter()
            .filter(|edge| {
                edge.edge_type == EdgeKind::Contains
                    && members.contains(&edge.source_id)
                    && members.contains(&edge.target_id)
            })
            .cloned()
            .collect();

        Ok(GraphSnapshot { nodes, edges })
    }

    async fn stats(&self) -> Result<GraphStats> {
        let state = self.state.read();
        Ok(GraphStats {
            nodes: state.nodes.len() as u64,
            edges: state.edges.len() as u64,
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write();
        state.nodes.clear();
        state.edges.clear();
        info!("Reference graph cleared");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "reference"
    }
}
