//! Core traits defining the code graph service interface.

use crate::error::Result;
use crate::model::*;
use async_trait::async_trait;

/// Ingestion and query operations over a code graph.
///
/// Implemented by the store-backed service and by the in-memory reference
/// implementation; both must return the same membership for the same inputs.
#[async_trait]
pub trait GraphQueryService: Send + Sync {
    /// Ingest the facts of one parsed source file.
    ///
    /// Each node is replaced by id, so re-ingesting the same payload leaves
    /// the graph unchanged. Children of the file from earlier calls that are
    /// not replaced stay attached to it.
    ///
    /// # Errors
    /// - `CodeGraphError::InvalidInput` if the payload fails validation
    /// - `CodeGraphError::PathConflict` if another File owns the path
    /// - `CodeGraphError::Store` if an insert or relate fails
    async fn ingest_parsed_code(&self, parsed: &ParsedCodeModel) -> Result<()>;

    /// List every node, optionally restricted to one kind
    async fn get_all_nodes(&self, node_type: Option<NodeKind>) -> Result<Vec<GraphNodeData>>;

    /// List the nodes adjacent to `node_id` in either direction.
    ///
    /// With `edge_type` set only edges of that kind are followed. An unknown
    /// id yields an empty list.
    async fn get_connected_nodes(
        &self,
        node_id: &str,
        edge_type: Option<EdgeKind>,
    ) -> Result<Vec<GraphNodeData>>;

    /// Subgraph of the File at `file_path` and its direct children.
    ///
    /// Returns `GraphSnapshot::empty()` when no File has that path.
    async fn get_code_graph_snapshot(&self, file_path: &str) -> Result<GraphSnapshot>;

    /// Node and CONTAINS edge totals
    async fn stats(&self) -> Result<GraphStats>;

    /// Remove all nodes and edges
    async fn clear(&self) -> Result<()>;

    /// Release the underlying store handle
    async fn close(&self) -> Result<()>;

    /// Short backend name for logs and CLI output
    fn backend_name(&self) -> &'static str;
}
