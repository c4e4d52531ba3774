//! Graph schema definitions.

use codegraph_core::error::{CodeGraphError, Result};
use codegraph_core::model::EdgeKind;

/// Table holding every vertex regardless of label
pub const NODE_TABLE: &str = "code_node";

/// Relation table backing an edge kind
pub fn edge_table(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Contains => "code_contains",
    }
}

/// SurrealQL schema for the code graph
pub const SCHEMA: &str = r#"
-- Vertices
DEFINE TABLE IF NOT EXISTS code_node SCHEMALESS;

DEFINE INDEX IF NOT EXISTS code_node_id ON code_node FIELDS nodeId UNIQUE;
DEFINE INDEX IF NOT EXISTS code_node_label ON code_node FIELDS label;
DEFINE INDEX IF NOT EXISTS code_node_path ON code_node FIELDS filePath;

-- File -> Function/Class containment
DEFINE TABLE IF NOT EXISTS code_contains SCHEMALESS TYPE RELATION IN code_node OUT code_node;
"#;

/// Initialize the graph schema; safe to run on every connect
pub async fn init_schema(db: &surrealdb::Surreal<impl surrealdb::Connection>) -> Result<()> {
    tracing::debug!("Initializing graph schema");

    db.query(SCHEMA)
        .await
        .and_then(|response| response.check())
        .map_err(|e| CodeGraphError::connection(format!("Failed to initialize schema: {}", e)))?;

    tracing::debug!("Graph schema initialized");
    Ok(())
}
